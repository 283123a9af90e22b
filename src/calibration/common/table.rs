//! Fixed-shape whitespace-separated text tables.
//!
//! Both the reference tables and the patch-set files are `rows x COLS` grids of
//! numbers, one row per line. Blank lines are ignored; anything else that does
//! not parse is reported with its 1-based line number.

use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableError {
    /// 1-based line number, 0 when the problem is the table as a whole.
    pub line: usize,
    pub reason: String,
}

pub fn parse_fixed_table<T: FromStr + Copy + Default, const COLS: usize>(
    text: &str,
    rows: usize,
) -> Result<Vec<[T; COLS]>, TableError> {
    let mut table = Vec::with_capacity(rows);

    for (line_index, line) in text.lines().enumerate() {
        let line_no = line_index + 1;
        if line.trim().is_empty() {
            continue;
        }
        if table.len() == rows {
            return Err(TableError {
                line: line_no,
                reason: format!("expected exactly {rows} rows"),
            });
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != COLS {
            return Err(TableError {
                line: line_no,
                reason: format!("expected {COLS} values, found {}", tokens.len()),
            });
        }

        let mut row = [T::default(); COLS];
        for (slot, token) in row.iter_mut().zip(&tokens) {
            *slot = token.parse().map_err(|_| TableError {
                line: line_no,
                reason: format!("\"{token}\" is not a valid number"),
            })?;
        }
        table.push(row);
    }

    if table.len() != rows {
        return Err(TableError {
            line: 0,
            reason: format!("expected exactly {rows} rows, found {}", table.len()),
        });
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_blank_lines() {
        let table: Vec<[f64; 2]> = parse_fixed_table("1 2\n\n  3.5\t-4\n\n", 2).unwrap();
        assert_eq!(table, vec![[1.0, 2.0], [3.5, -4.0]]);
    }

    #[test]
    fn test_reports_offending_line() {
        let err = parse_fixed_table::<f64, 2>("1 2\n3 x\n", 2).unwrap_err();
        assert_eq!(err.line, 2);

        let err = parse_fixed_table::<f64, 2>("1 2\n3 4 5\n", 2).unwrap_err();
        assert_eq!(err.line, 2);

        let err = parse_fixed_table::<f64, 2>("1 2\n3 4\n5 6\n", 2).unwrap_err();
        assert_eq!(err.line, 3);

        let err = parse_fixed_table::<f64, 2>("1 2\n", 2).unwrap_err();
        assert_eq!(err.line, 0);
    }
}
