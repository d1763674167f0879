// Encoding shorthand parser
// Format: x: col, y: col | [col, col, ...], z: col
// Channels may appear in any order; z is optional.

use super::lexer::{field_name, ws};
use crate::error::{ChartError, ChartResult};
use crate::ir::{Encoding, FieldSelection};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{all_consuming, map},
    multi::separated_list1,
    sequence::{delimited, preceded, terminated},
    IResult,
};

/// One `channel: fields` pair
#[derive(Debug, Clone, PartialEq)]
pub enum EncodingEntry {
    X(String),
    Y(FieldSelection),
    Z(String),
}

fn channel<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(ws(tag(name)), ws(char(':')))
}

fn field_list(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        ws(char('[')),
        separated_list1(ws(char(',')), ws(field_name)),
        ws(char(']')),
    )(input)
}

fn y_selection(input: &str) -> IResult<&str, FieldSelection> {
    alt((
        map(field_list, FieldSelection::Many),
        map(ws(field_name), FieldSelection::One),
    ))(input)
}

fn parse_entry(input: &str) -> IResult<&str, EncodingEntry> {
    alt((
        map(preceded(channel("x"), ws(field_name)), EncodingEntry::X),
        map(preceded(channel("y"), y_selection), EncodingEntry::Y),
        map(preceded(channel("z"), ws(field_name)), EncodingEntry::Z),
    ))(input)
}

/// Parse comma-separated channel entries, returning the remaining input
pub fn parse_encoding(input: &str) -> IResult<&str, Vec<EncodingEntry>> {
    separated_list1(ws(char(',')), parse_entry)(input)
}

/// Parse a complete shorthand such as `x: date, y: [sales, profit], z: region`
pub fn parse_encoding_str(input: &str) -> ChartResult<Encoding> {
    let (_, entries) = all_consuming(ws(parse_encoding))(input)
        .map_err(|e| ChartError::configuration(format!("invalid encoding '{}': {}", input, e)))?;

    let mut x = None;
    let mut y = None;
    let mut z = None;
    for entry in entries {
        let repeated = match entry {
            EncodingEntry::X(field) => x.replace(field).is_some(),
            EncodingEntry::Y(selection) => y.replace(selection).is_some(),
            EncodingEntry::Z(field) => z.replace(field).is_some(),
        };
        if repeated {
            return Err(ChartError::configuration(format!(
                "invalid encoding '{}': channel given more than once",
                input
            )));
        }
    }

    let x = x.ok_or_else(|| ChartError::configuration("encoding requires an x field"))?;
    let y = y.ok_or_else(|| ChartError::configuration("encoding requires a y field"))?;
    Ok(Encoding { x, y, z })
}
