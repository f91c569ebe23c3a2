use std::collections::HashMap;

use crate::display_width::{display_width, truncate_to_width};
use crate::graph_layout::{EdgeLayout, GraphLayout, NodeLayout, NodeShape, Side};

const UNITS_PER_COL: f64 = 8.0;
const UNITS_PER_ROW: f64 = 20.0;
const MARGIN: usize = 1;
const MIN_BOX_WIDTH: usize = 5;
const MIN_BOX_HEIGHT: usize = 3;

struct Grid {
    cells: Vec<Vec<char>>,
    width: usize,
    height: usize,
}

impl Grid {
    fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![vec![' '; width]; height],
            width,
            height,
        }
    }

    fn get(&self, row: usize, col: usize) -> char {
        if row < self.height && col < self.width {
            self.cells[row][col]
        } else {
            ' '
        }
    }

    fn set(&mut self, row: usize, col: usize, ch: char) {
        if row < self.height && col < self.width {
            if self.cells[row][col] == '\0' && col > 0 && self.cells[row][col - 1] != '\0' {
                self.cells[row][col - 1] = ' ';
            }
            self.cells[row][col] = ch;
        }
    }

    fn write_str(&mut self, row: usize, col: usize, s: &str) {
        let mut offset = 0;
        for ch in s.chars() {
            self.set(row, col + offset, ch);
            let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(1);
            for j in 1..w {
                self.set(row, col + offset + j, '\0');
            }
            offset += w;
        }
    }

    /// Rows are right-trimmed; blank margins around the drawing are dropped.
    fn render(&self) -> String {
        let lines: Vec<String> = self
            .cells
            .iter()
            .map(|row| {
                let line: String = row.iter().filter(|&&ch| ch != '\0').collect();
                line.trim_end().to_string()
            })
            .collect();

        let first = lines.iter().position(|l| !l.is_empty());
        let last = lines.iter().rposition(|l| !l.is_empty());
        let (Some(first), Some(last)) = (first, last) else {
            return String::new();
        };
        let body = &lines[first..=last];
        let indent = body
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| l.chars().take_while(|&c| c == ' ').count())
            .min()
            .unwrap_or(0);

        body.iter()
            .map(|l| l.chars().skip(indent).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A node's footprint in grid cells.
#[derive(Debug, Clone, Copy)]
struct CellBox {
    row: usize,
    col: usize,
    width: usize,
    height: usize,
}

impl CellBox {
    fn of(node: &NodeLayout) -> Self {
        Self {
            row: MARGIN + to_cells(node.y, UNITS_PER_ROW),
            col: MARGIN + to_cells(node.x, UNITS_PER_COL),
            width: to_cells(node.width, UNITS_PER_COL).max(MIN_BOX_WIDTH),
            height: to_cells(node.height, UNITS_PER_ROW).max(MIN_BOX_HEIGHT),
        }
    }

    fn center_row(&self) -> usize {
        self.row + self.height / 2
    }

    fn center_col(&self) -> usize {
        self.col + self.width / 2
    }

    /// The border cell an edge attaches to and the free cell just outside it.
    fn port(&self, side: Side) -> ((usize, usize), (usize, usize)) {
        let (r, c) = (self.center_row(), self.center_col());
        match side {
            Side::Top => ((self.row, c), (self.row - 1, c)),
            Side::Bottom => (
                (self.row + self.height - 1, c),
                (self.row + self.height, c),
            ),
            Side::Left => ((r, self.col), (r, self.col - 1)),
            Side::Right => ((r, self.col + self.width - 1), (r, self.col + self.width)),
        }
    }
}

fn to_cells(units: f64, per_cell: f64) -> usize {
    (units.max(0.0) / per_cell).round() as usize
}

const DIR_L: u8 = 1;
const DIR_R: u8 = 2;
const DIR_U: u8 = 4;
const DIR_D: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stroke {
    Plain,
    Thick,
    Dashed,
}

impl Stroke {
    fn of(edge: &EdgeLayout) -> Self {
        if edge.style.is_dashed() {
            Stroke::Dashed
        } else if edge.style.stroke_width >= 3 {
            Stroke::Thick
        } else {
            Stroke::Plain
        }
    }

    fn horizontal(self) -> char {
        match self {
            Stroke::Plain => '─',
            Stroke::Thick => '═',
            Stroke::Dashed => '╌',
        }
    }

    fn vertical(self) -> char {
        match self {
            Stroke::Plain => '│',
            Stroke::Thick => '║',
            Stroke::Dashed => '┊',
        }
    }

    fn glyph(self, conn: u8) -> char {
        match conn {
            DIR_L | DIR_R => self.horizontal(),
            DIR_U | DIR_D => self.vertical(),
            c if c == DIR_L | DIR_R => self.horizontal(),
            c if c == DIR_U | DIR_D => self.vertical(),
            c => connections_to_char(c).unwrap_or(' '),
        }
    }
}

fn connections_to_char(conn: u8) -> Option<char> {
    match conn {
        c if c == DIR_R | DIR_D => Some('┌'),
        c if c == DIR_L | DIR_D => Some('┐'),
        c if c == DIR_R | DIR_U => Some('└'),
        c if c == DIR_L | DIR_U => Some('┘'),
        c if c == DIR_L | DIR_R | DIR_D => Some('┬'),
        c if c == DIR_L | DIR_R | DIR_U => Some('┴'),
        c if c == DIR_U | DIR_D | DIR_R => Some('├'),
        c if c == DIR_U | DIR_D | DIR_L => Some('┤'),
        c if c == DIR_L | DIR_R | DIR_U | DIR_D => Some('┼'),
        _ => None,
    }
}

/// Edge strokes are collected as per-cell connection masks first so that
/// crossings and shared segments merge into proper junctions.
struct StrokeLayer {
    masks: Vec<Vec<u8>>,
    strokes: Vec<Vec<Stroke>>,
}

impl StrokeLayer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            masks: vec![vec![0; width]; height],
            strokes: vec![vec![Stroke::Plain; width]; height],
        }
    }

    fn mark(&mut self, (row, col): (usize, usize), dir: u8, stroke: Stroke) {
        if let Some(cell) = self.masks.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell |= dir;
            self.strokes[row][col] = stroke;
        }
    }

    fn segment(&mut self, from: (usize, usize), to: (usize, usize), stroke: Stroke) {
        let (mut r, mut c) = from;
        while (r, c) != to {
            let (next, out_dir, in_dir) = if r < to.0 {
                ((r + 1, c), DIR_D, DIR_U)
            } else if r > to.0 {
                ((r - 1, c), DIR_U, DIR_D)
            } else if c < to.1 {
                ((r, c + 1), DIR_R, DIR_L)
            } else {
                ((r, c - 1), DIR_L, DIR_R)
            };
            self.mark((r, c), out_dir, stroke);
            self.mark(next, in_dir, stroke);
            (r, c) = next;
        }
    }

    fn draw_onto(&self, grid: &mut Grid) {
        for (row, masks) in self.masks.iter().enumerate() {
            for (col, &mask) in masks.iter().enumerate() {
                if mask != 0 {
                    grid.set(row, col, self.strokes[row][col].glyph(mask));
                }
            }
        }
    }
}

/// Direction bit pointing from a port's outer cell back into the node.
fn inward(side: Side) -> u8 {
    match side {
        Side::Top => DIR_D,
        Side::Bottom => DIR_U,
        Side::Left => DIR_R,
        Side::Right => DIR_L,
    }
}

fn arrow_head(side: Side) -> char {
    match side {
        Side::Top => '▼',
        Side::Bottom => '▲',
        Side::Left => '>',
        Side::Right => '<',
    }
}

fn border_join(side: Side, current: char) -> Option<char> {
    match (side, current) {
        (Side::Top, '─') => Some('┴'),
        (Side::Bottom, '─') => Some('┬'),
        (Side::Left, '│') => Some('┤'),
        (Side::Right, '│') => Some('├'),
        _ => None,
    }
}

/// Draw a laid-out genogram as box-drawing text.
///
/// Squares are male, rounded boxes female, slanted corners any other gender.
/// Deceased members carry a `╳` in the top-right corner. Married edges are
/// doubled, divorced edges dashed, parent-child edges end in an arrow.
/// Self-loops are not drawn.
pub fn render(layout: &GraphLayout) -> String {
    if layout.nodes.is_empty() {
        return String::new();
    }

    let boxes: Vec<CellBox> = layout.nodes.iter().map(CellBox::of).collect();
    let mut node_index: HashMap<&str, usize> = HashMap::new();
    for (i, node) in layout.nodes.iter().enumerate() {
        node_index.entry(node.id.as_str()).or_insert(i);
    }

    let width = boxes.iter().map(|b| b.col + b.width).max().unwrap_or(0) + MARGIN + 1;
    let height = boxes.iter().map(|b| b.row + b.height).max().unwrap_or(0) + MARGIN + 1;
    let mut grid = Grid::new(width, height);
    let mut strokes = StrokeLayer::new(width, height);
    let mut arrows: Vec<((usize, usize), char)> = Vec::new();
    let mut joins: Vec<((usize, usize), Side)> = Vec::new();

    for edge in &layout.edges {
        let (Some(&s), Some(&t)) = (
            node_index.get(edge.source.as_str()),
            node_index.get(edge.target.as_str()),
        ) else {
            continue;
        };
        if s == t {
            continue;
        }
        let stroke = Stroke::of(edge);
        let (source_border, start) = boxes[s].port(edge.source_side);
        let (target_border, end) = boxes[t].port(edge.target_side);

        strokes.mark(start, inward(edge.source_side), stroke);
        strokes.mark(end, inward(edge.target_side), stroke);
        for pair in route(start, edge.source_side, end).windows(2) {
            strokes.segment(pair[0], pair[1], stroke);
        }

        if edge.style.has_arrow() {
            arrows.push((end, arrow_head(edge.target_side)));
        }
        joins.push((source_border, edge.source_side));
        joins.push((target_border, edge.target_side));
    }

    strokes.draw_onto(&mut grid);
    for ((row, col), ch) in arrows {
        grid.set(row, col, ch);
    }
    for (node, cell) in layout.nodes.iter().zip(&boxes) {
        draw_node(&mut grid, node, cell);
    }
    for ((row, col), side) in joins {
        if let Some(ch) = border_join(side, grid.get(row, col)) {
            grid.set(row, col, ch);
        }
    }

    grid.render()
}

/// Orthogonal route through the midpoint, leaving along the port's axis.
fn route(start: (usize, usize), side: Side, end: (usize, usize)) -> Vec<(usize, usize)> {
    match side {
        Side::Top | Side::Bottom => {
            let mid_row = (start.0 + end.0) / 2;
            vec![start, (mid_row, start.1), (mid_row, end.1), end]
        }
        Side::Left | Side::Right => {
            let mid_col = (start.1 + end.1) / 2;
            vec![start, (start.0, mid_col), (end.0, mid_col), end]
        }
    }
}

fn draw_node(grid: &mut Grid, node: &NodeLayout, cell: &CellBox) {
    let (top_left, top_right, bottom_left, bottom_right) = match node.data.shape {
        NodeShape::Square => ('┌', '┐', '└', '┘'),
        NodeShape::Circle => ('╭', '╮', '╰', '╯'),
        NodeShape::Diamond => ('╱', '╲', '╲', '╱'),
    };
    let (x, y, w, h) = (cell.col, cell.row, cell.width, cell.height);

    for row in y..y + h {
        for col in x..x + w {
            grid.set(row, col, ' ');
        }
    }

    grid.set(y, x, top_left);
    grid.set(y + h - 1, x, bottom_left);
    for col in (x + 1)..(x + w - 1) {
        grid.set(y, col, '─');
        grid.set(y + h - 1, col, '─');
    }
    grid.set(y, x + w - 1, if node.data.deceased { '╳' } else { top_right });
    grid.set(y + h - 1, x + w - 1, bottom_right);
    for row in (y + 1)..(y + h - 1) {
        grid.set(row, x, '│');
        grid.set(row, x + w - 1, '│');
    }

    let inner = w - 2;
    let max_label = inner.saturating_sub(2).max(1);
    for (i, line) in node.data.label_lines().into_iter().take(h - 2).enumerate() {
        let text = truncate_to_width(line, max_label);
        let pad = (inner - display_width(&text)) / 2;
        grid.write_str(y + 1 + i, x + 1 + pad, &text);
    }
}
