//! Plain-text table for the `top` command. Columns are padded by display
//! width so rows with Han characters line up.

use poem_types::GeoStat;
use unicode_width::UnicodeWidthStr;

const HEADERS: [&str; 5] = ["#", "地名", "次数", "类型", "今地"];

fn pad(cell: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.width()));
    if right_align {
        format!("{fill}{cell}")
    } else {
        format!("{cell}{fill}")
    }
}

/// Render the first `limit` places as a table, one line per row.
pub fn render_top(stats: &[GeoStat], limit: usize) -> String {
    let rows: Vec<[String; 5]> = stats
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, s)| {
            [
                (i + 1).to_string(),
                s.name.clone(),
                s.total_count.to_string(),
                s.geo_type.as_chinese().to_string(),
                s.modern_name.clone(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.width()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.width());
        }
    }

    let line = |cells: [&str; 5]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| pad(cell, widths[i], i == 0 || i == 2))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(HEADERS)];
    for row in &rows {
        out.push(line([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
            row[4].as_str(),
        ]));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use poem_types::GeoType;
    use std::collections::BTreeMap;

    fn stat(name: &str, count: usize, geo_type: GeoType, modern: &str) -> GeoStat {
        GeoStat {
            name: name.into(),
            geo_type,
            modern_name: modern.into(),
            total_count: count,
            sentiment_distribution: BTreeMap::new(),
            avg_sentiment_score: None,
            poets: vec![],
            coordinate: None,
            by_dynasty: vec![],
        }
    }

    #[test]
    fn test_columns_align_by_display_width() {
        let stats = vec![
            stat("长安", 120, GeoType::City, "陕西西安"),
            stat("八百里洞庭湖", 7, GeoType::Lake, "湖南岳阳"),
        ];
        let table = render_top(&stats, 10);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);

        // The count column ends at the same display offset on every line.
        let count_end = |line: &str, count: &str| {
            let idx = line.find(count).unwrap() + count.len();
            line[..idx].width()
        };
        assert_eq!(count_end(lines[1], "120"), count_end(lines[2], "7"));
        assert_eq!(count_end(lines[0], "次数"), count_end(lines[1], "120"));
        assert!(lines[1].contains("城市"));
    }

    #[test]
    fn test_limit_truncates_rows() {
        let stats = vec![
            stat("长安", 3, GeoType::City, "西安"),
            stat("洛阳", 2, GeoType::City, "洛阳"),
        ];
        assert_eq!(render_top(&stats, 1).lines().count(), 2);
        assert_eq!(render_top(&[], 5).lines().count(), 1);
    }
}
