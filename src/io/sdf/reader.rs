use crate::io::error::Error;
use crate::model::atom::Atom;
use crate::model::types::Element;
use std::collections::BTreeMap;
use std::io::{BufRead, Lines};

const RECORD_END: &str = "$$$$";
const BLOCK_END: &str = "M  END";

/// One V2000 record of an SDF file.
#[derive(Debug, Clone, PartialEq)]
pub struct SdfRecord {
    /// Zero-based position of the record in its file.
    pub index: usize,
    /// One-based line number of the record's first line.
    pub line: usize,
    pub title: String,
    /// Atoms in atom-block order.
    pub atoms: Vec<Atom>,
    pub bond_count: usize,
    /// Header through `M  END`, newline-terminated.
    pub molblock: String,
    /// `> <name>` data items. A repeated name keeps the last value.
    pub data: BTreeMap<String, String>,
}

impl SdfRecord {
    /// Value of the first present, non-blank data item among `names`.
    pub fn first_field(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.data.get(*name))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.first_field(&[name])
    }
}

/// Streaming reader over the records of a multi-record SDF file.
pub struct SdfReader<R> {
    lines: Lines<R>,
    line_no: usize,
    next_index: usize,
    done: bool,
}

impl<R: BufRead> SdfReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            next_index: 0,
            done: false,
        }
    }

    fn next_block(&mut self) -> Result<Option<Vec<(usize, String)>>, Error> {
        let mut block = Vec::new();
        for line in self.lines.by_ref() {
            let content = line?;
            self.line_no += 1;
            if content.trim_end() == RECORD_END {
                if block.iter().all(|(_, l): &(usize, String)| l.trim().is_empty()) {
                    block.clear();
                    continue;
                }
                return Ok(Some(block));
            }
            block.push((self.line_no, content));
        }
        if block.iter().all(|(_, l)| l.trim().is_empty()) {
            Ok(None)
        } else {
            Ok(Some(block))
        }
    }
}

impl<R: BufRead> Iterator for SdfReader<R> {
    type Item = Result<SdfRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let block = match self.next_block() {
            Ok(Some(block)) => block,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let index = self.next_index;
        self.next_index += 1;
        Some(parse_record(index, &block))
    }
}

fn parse_record(index: usize, lines: &[(usize, String)]) -> Result<SdfRecord, Error> {
    let first_line = lines.first().map(|(ln, _)| *ln).unwrap_or(1);
    if lines.len() < 4 {
        return Err(Error::parse(
            first_line,
            "SDF block must contain at least a header and counts line",
        ));
    }

    let (counts_line_no, counts_line) = (&lines[3].0, &lines[3].1);
    if counts_line.contains("V3000") {
        return Err(Error::parse(*counts_line_no, "V3000 is not supported"));
    }

    let (atom_count, bond_count) = parse_counts(counts_line, *counts_line_no)?;
    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    if lines.len() < bond_start + bond_count {
        return Err(Error::parse(
            lines.last().map(|(ln, _)| *ln).unwrap_or(*counts_line_no),
            "SDF block ended before atoms/bonds were fully specified",
        ));
    }

    let atoms = parse_atoms(&lines[atom_start..bond_start])?;
    validate_bonds(&lines[bond_start..bond_start + bond_count], atom_count)?;

    let end = lines[bond_start + bond_count..]
        .iter()
        .position(|(_, l)| l.trim_end() == BLOCK_END)
        .map(|offset| bond_start + bond_count + offset)
        .ok_or_else(|| {
            Error::parse(
                lines.last().map(|(ln, _)| *ln).unwrap_or(*counts_line_no),
                "missing 'M  END' terminator",
            )
        })?;

    let mut molblock = String::new();
    for (_, line) in &lines[..=end] {
        molblock.push_str(line);
        molblock.push('\n');
    }

    Ok(SdfRecord {
        index,
        line: first_line,
        title: lines[0].1.trim().to_string(),
        atoms,
        bond_count,
        molblock,
        data: parse_data_items(&lines[end + 1..]),
    })
}

fn parse_counts(line: &str, line_no: usize) -> Result<(usize, usize), Error> {
    let field = |range: std::ops::Range<usize>| line.get(range).map(str::trim);
    let fixed = field(0..3)
        .and_then(|a| a.parse::<usize>().ok())
        .zip(field(3..6).and_then(|b| b.parse::<usize>().ok()));
    if let Some(counts) = fixed {
        return Ok(counts);
    }

    let tokens: Vec<_> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(Error::parse(
            line_no,
            "counts line must contain atom and bond counts",
        ));
    }
    let atoms = tokens[0]
        .parse::<usize>()
        .map_err(|_| Error::parse(line_no, "invalid atom count"))?;
    let bonds = tokens[1]
        .parse::<usize>()
        .map_err(|_| Error::parse(line_no, "invalid bond count"))?;
    Ok((atoms, bonds))
}

fn parse_atoms(lines: &[(usize, String)]) -> Result<Vec<Atom>, Error> {
    let mut atoms = Vec::with_capacity(lines.len());
    for (ln, raw) in lines {
        let atom = match parse_atom_fixed(raw) {
            Some(atom) => atom,
            None => parse_atom_tokens(raw).map_err(|details| Error::parse(*ln, details))?,
        };
        atoms.push(atom);
    }
    Ok(atoms)
}

/// Column layout of the CTfile specification: `xxxxx.xxxxyyyyy.yyyyzzzzz.zzzz aaa`.
fn parse_atom_fixed(raw: &str) -> Option<Atom> {
    if !raw.is_ascii() {
        return None;
    }
    let padded = format!("{raw:<40}");
    let x = padded[0..10].trim().parse::<f64>().ok()?;
    let y = padded[10..20].trim().parse::<f64>().ok()?;
    let z = padded[20..30].trim().parse::<f64>().ok()?;
    let element = Element::from_symbol(padded[31..34].trim())?;
    finite_atom(element, [x, y, z])
}

/// Whitespace-separated fallback for writers that ignore the column layout.
fn parse_atom_tokens(raw: &str) -> Result<Atom, &'static str> {
    let tokens: Vec<_> = raw.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err("invalid atom line");
    }
    let coord = |t: &str| t.parse::<f64>().map_err(|_| "invalid coordinate in atom line");
    let position = [coord(tokens[0])?, coord(tokens[1])?, coord(tokens[2])?];
    let element = Element::from_symbol(tokens[3]).ok_or("unable to infer element symbol")?;
    finite_atom(element, position).ok_or("non-finite coordinate in atom line")
}

fn finite_atom(element: Element, position: [f64; 3]) -> Option<Atom> {
    position
        .iter()
        .all(|c| c.is_finite())
        .then(|| Atom::new(element, position))
}

fn validate_bonds(lines: &[(usize, String)], atom_count: usize) -> Result<(), Error> {
    for (ln, raw) in lines {
        let field = |range: std::ops::Range<usize>| {
            raw.get(range).and_then(|s| s.trim().parse::<usize>().ok())
        };
        let (a1, a2, order) = match (field(0..3), field(3..6), field(6..9)) {
            (Some(a1), Some(a2), Some(order)) => (a1, a2, order),
            _ => {
                let tokens: Vec<_> = raw.split_whitespace().collect();
                if tokens.len() < 3 {
                    return Err(Error::parse(*ln, "invalid bond line"));
                }
                let parse = |t: &str, what: &'static str| {
                    t.parse::<usize>().map_err(|_| Error::parse(*ln, what))
                };
                (
                    parse(tokens[0], "invalid first atom index")?,
                    parse(tokens[1], "invalid second atom index")?,
                    parse(tokens[2], "invalid bond order value")?,
                )
            }
        };

        if !(1..=8).contains(&order) {
            return Err(Error::parse(*ln, "unsupported bond order in bond line"));
        }
        if a1 == 0 || a2 == 0 || a1 > atom_count || a2 > atom_count {
            return Err(Error::parse(
                *ln,
                "bond references atom outside declared range",
            ));
        }
    }
    Ok(())
}

fn parse_data_items(lines: &[(usize, String)]) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    let mut iter = lines.iter().map(|(_, l)| l.as_str()).peekable();
    while let Some(line) = iter.next() {
        let Some(name) = data_item_name(line) else {
            continue;
        };
        let mut value = Vec::new();
        while let Some(next) = iter.peek() {
            if next.trim().is_empty() || data_item_name(next).is_some() {
                break;
            }
            value.push(next.trim_end());
            iter.next();
        }
        data.insert(name.to_string(), value.join("\n"));
    }
    data
}

/// `> <name>` or `>  <name> (12)` header lines.
fn data_item_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('>')?;
    let start = rest.find('<')? + 1;
    let len = rest[start..].find('>')?;
    Some(&rest[start..start + len])
}
