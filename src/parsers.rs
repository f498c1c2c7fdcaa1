use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_till, take_until},
    character::complete::{char, multispace0, multispace1, not_line_ending, satisfy, space0, space1},
    combinator::{eof, recognize},
    sequence::{delimited, preceded, terminated},
};

/// Separator between a value's name and its type in `reg query` output
const REG_TYPE_SEPARATOR: &str = "    REG_";

pub fn parse_between_double_quotes(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_till(|c| c == '"'), char('"')).parse(input)
}

// VDF / ACF --------------------------------------------------------------------------------
/// For parsing a `"key"		"value"` pair in Steam's key-value files, where the key must match
/// the given key. Escaped backslashes in the value are unescaped.
pub fn parse_value_vdf<'a>(input: &'a str, key: &str) -> IResult<&'a str, String> {
    preceded(
        (multispace0, char('"'), tag(key), char('"'), multispace1),
        parse_between_double_quotes,
    )
    .map(|value: &str| value.replace("\\\\", "\\"))
    .parse(input)
}

/// Returns every value associated with the given key, in file order
///
/// Occurrences of the quoted key which aren't followed by a quoted value (e.g. section headers)
/// are skipped.
pub fn find_all_values_vdf(file_content: &str, key: &str) -> Vec<String> {
    let quoted_key = format!("\"{key}\"");
    let mut values = Vec::new();
    let mut remaining = file_content;

    while let Ok((at_key, _)) =
        take_until::<&str, &str, nom::error::Error<&str>>(quoted_key.as_str()).parse(remaining)
    {
        match parse_value_vdf(at_key, key) {
            Ok((rest, value)) => {
                values.push(value);
                remaining = rest;
            }
            Err(_) => remaining = &at_key[quoted_key.len()..],
        }
    }

    values
}

/// Returns the first value associated with the given key
pub fn find_value_vdf(file_content: &str, key: &str) -> Option<String> {
    find_all_values_vdf(file_content, key).into_iter().next()
}

// REGISTRY ---------------------------------------------------------------------------------
/// A single value line from `reg query` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryValueLine<'a> {
    pub name: &'a str,
    pub kind: &'a str,
    pub data: &'a str,
}

/// Matches a key line from `reg query` output, e.g. `HKEY_LOCAL_MACHINE\SOFTWARE\Ubisoft`
pub fn parse_registry_key_line(line: &str) -> IResult<&str, &str> {
    recognize(preceded(tag("HKEY"), not_line_ending)).parse(line.trim_end())
}

/// Matches an (indented) value line from `reg query` output, e.g.
/// `    InstallDir    REG_SZ    C:\Games\Anno 1800`
pub fn parse_registry_value_line(line: &str) -> IResult<&str, RegistryValueLine<'_>> {
    (
        space1,
        take_until(REG_TYPE_SEPARATOR),
        space1,
        recognize(preceded(tag("REG_"), take_till(char::is_whitespace))),
        space0,
        not_line_ending,
    )
        .map(|(_, name, _, kind, _, data): (&str, &str, &str, &str, &str, &str)| {
            RegistryValueLine {
                name: name.trim(),
                kind,
                data: data.trim(),
            }
        })
        .parse(line)
}

// DRIVES -----------------------------------------------------------------------------------
/// Matches a line of `wmic logicaldisk get name` output holding a single drive, e.g. `C:`
pub fn parse_drive_letter(line: &str) -> IResult<&str, char> {
    terminated(satisfy(|c| c.is_ascii_uppercase()), (char(':'), eof)).parse(line.trim())
}

/// Matches a line of a mount table (`/proc/self/mounts`), returning the device, mount point and
/// filesystem type
pub fn parse_mount_line(line: &str) -> IResult<&str, (&str, &str, &str)> {
    (
        take_till(char::is_whitespace),
        space1,
        take_till(char::is_whitespace),
        space1,
        take_till(char::is_whitespace),
    )
        .map(|(device, _, mount_point, _, fs_type)| (device, mount_point, fs_type))
        .parse(line)
}
