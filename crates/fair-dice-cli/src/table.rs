//! Text rendering of the pairwise win-probability table.

use fair_dice_core::{probability_table, DiceSet};

/// Render `P(row die beats column die)` for every pair of dice.
pub fn render_probability_table(dice: &DiceSet) -> String {
    let table = probability_table(dice);

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(dice.len() + 1);
    let mut header = vec!["row \\ col".to_string()];
    header.extend(dice.iter().map(|die| die.to_string()));
    rows.push(header);

    for (die, cells) in dice.iter().zip(&table) {
        let mut row = vec![die.to_string()];
        row.extend(cells.iter().map(|cell| match cell {
            Some(p) => format!("{} ({}/{})", p, p.numerator(), p.denominator()),
            None => "-".to_string(),
        }));
        rows.push(row);
    }

    let columns = rows[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|c| rows.iter().map(|row| row[c].len()).max().unwrap_or(0))
        .collect();

    let separator = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{separator}+");

    let mut out = String::new();
    out.push_str(&separator);
    for (i, row) in rows.iter().enumerate() {
        out.push('\n');
        out.push('|');
        for (cell, &width) in row.iter().zip(&widths) {
            out.push_str(&format!(" {cell:<width$} |"));
        }
        if i == 0 {
            out.push('\n');
            out.push_str(&separator);
        }
    }
    out.push('\n');
    out.push_str(&separator);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_contains_all_pairs() {
        let dice = DiceSet::parse(&["2,2,4,4,9,9", "1,1,6,6,8,8", "3,3,5,5,7,7"]).unwrap();
        let rendered = render_probability_table(&dice);
        let lines: Vec<&str> = rendered.lines().collect();

        // separator, header, separator, 3 rows, separator
        assert_eq!(lines.len(), 7);
        assert!(lines[1].contains("[1,1,6,6,8,8]"));
        assert!(lines[3].starts_with("| [2,2,4,4,9,9]"));
        assert!(lines[3].contains("0.5556 (5/9)"));
        assert!(lines[4].contains("0.4444 (4/9)"));
        assert_eq!(lines[3].matches(" - ").count(), 1);

        // All lines line up.
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
    }
}
