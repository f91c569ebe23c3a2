use winnow::prelude::*;
use winnow::combinator::{alt, opt, preceded};
use winnow::token::{rest, take_while};

use crate::graph_layout::RankDir;
use crate::rank::Ranker;

/// A calendar date as typed into the member form. Month and day are optional
/// so that partial dates still yield a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate {
    pub year: i32,
    pub month: Option<u8>,
    pub day: Option<u8>,
}

pub fn parse_date(input: &str) -> Result<CalendarDate, String> {
    let trimmed = input.trim();
    let mut rest_input = trimmed;
    let date = calendar_date(&mut rest_input).map_err(|_| format!("invalid date: `{trimmed}`"))?;
    if !rest_input.is_empty() {
        return Err(format!("invalid date: `{trimmed}`"));
    }
    Ok(date)
}

/// Year of a date string, as the export format writes it.
pub fn derive_year(date: &str) -> Option<String> {
    parse_date(date).ok().map(|d| d.year.to_string())
}

pub fn parse_rank_dir(input: &str) -> Result<RankDir, String> {
    let normalized = input.trim().to_ascii_uppercase();
    let mut rest_input = normalized.as_str();
    match rank_dir(&mut rest_input) {
        Ok(dir) if rest_input.is_empty() => Ok(dir),
        _ => Err(format!("unknown rank direction: `{}`", input.trim())),
    }
}

pub fn parse_ranker(input: &str) -> Result<Ranker, String> {
    let normalized = input.trim().to_ascii_lowercase();
    let mut rest_input = normalized.as_str();
    match ranker(&mut rest_input) {
        Ok(r) if rest_input.is_empty() => Ok(r),
        _ => Err(format!("unknown ranker: `{}`", input.trim())),
    }
}

fn calendar_date(input: &mut &str) -> winnow::Result<CalendarDate> {
    let year = year.parse_next(input)?;
    let month = opt(preceded("-", month)).parse_next(input)?;
    let day = match month {
        Some(_) => opt(preceded("-", day)).parse_next(input)?,
        None => None,
    };
    if day.is_some() {
        opt(time_suffix).parse_next(input)?;
    }
    Ok(CalendarDate { year, month, day })
}

fn year(input: &mut &str) -> winnow::Result<i32> {
    take_while(4, |c: char| c.is_ascii_digit())
        .try_map(|s: &str| s.parse::<i32>())
        .parse_next(input)
}

fn two_digits(input: &mut &str) -> winnow::Result<u8> {
    take_while(1..=2, |c: char| c.is_ascii_digit())
        .try_map(|s: &str| s.parse::<u8>())
        .parse_next(input)
}

fn month(input: &mut &str) -> winnow::Result<u8> {
    two_digits.verify(|m: &u8| (1..=12).contains(m)).parse_next(input)
}

fn day(input: &mut &str) -> winnow::Result<u8> {
    two_digits.verify(|d: &u8| (1..=31).contains(d)).parse_next(input)
}

fn time_suffix<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    preceded(alt(("T", " ")), rest).parse_next(input)
}

fn rank_dir(input: &mut &str) -> winnow::Result<RankDir> {
    alt((
        "TB".value(RankDir::TopBottom),
        "TD".value(RankDir::TopBottom),
        "BT".value(RankDir::BottomTop),
        "LR".value(RankDir::LeftRight),
        "RL".value(RankDir::RightLeft),
    ))
    .parse_next(input)
}

fn ranker(input: &mut &str) -> winnow::Result<Ranker> {
    alt((
        "network-simplex".value(Ranker::NetworkSimplex),
        "tight-tree".value(Ranker::TightTree),
        "longest-path".value(Ranker::LongestPath),
    ))
    .parse_next(input)
}
