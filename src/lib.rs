pub mod display_width;
pub mod edge_style;
pub mod error;
pub mod graph_layout;
pub mod graph_model;
pub mod graph_renderer;
pub mod order;
pub mod parser;
pub mod rank;
pub mod session;
pub mod snapshot;
pub mod types;
pub mod validator;

pub use error::{GenogramError, Result, ValidationError};
pub use graph_layout::{GraphLayout, LayoutOptions, RankDir, compute_layout};
pub use graph_model::GraphModel;
pub use session::Session;

/// Lay out a genogram document and draw it as text.
pub fn render(input: &str) -> Result<String> {
    render_with_options(input, &LayoutOptions::default())
}

pub fn render_with_options(input: &str, options: &LayoutOptions) -> Result<String> {
    let model = GraphModel::from_json(input)?;
    Ok(graph_renderer::render(&model.compute_layout(options)))
}

/// The computed layout as pretty-printed JSON.
pub fn layout_json(input: &str, options: &LayoutOptions) -> Result<String> {
    let model = GraphModel::from_json(input)?;
    Ok(serde_json::to_string_pretty(&model.compute_layout(options))?)
}

/// Re-export a document in normalized form.
pub fn export_json(input: &str) -> Result<String> {
    GraphModel::from_json(input)?.export_json()
}
