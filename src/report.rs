// CSV exports and console tables. Every CSV is rendered into memory first and
// only written once complete, so a failed run leaves no partial file behind.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

use crate::analysis::*;
use crate::category::CategoryTable;
use crate::data_loader::TeamWeekRecord;
use crate::error::Result;
use crate::leaders::LeaderRow;
use crate::standings::MergedRow;

// Shortest representation that reads back to the same f64.
fn num(v: f64) -> String {
    format!("{}", v)
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn points_column(category: &str) -> String {
    format!("{} Points", category)
}

// Expected Points is the sum of the "<category> Points" columns; the bare
// category columns are the per-category rank sums, totalled in "Rank Sum".
pub fn write_standings_csv<W: io::Write>(
    out: W,
    rows: &[MergedRow],
    categories: &CategoryTable,
) -> Result<()> {
    let mut header: Vec<String> =
        vec!["team_key".into(), "team_name".into(), "Expected Points".into()];
    header.extend(categories.names().map(points_column));
    header.push("Rank Sum".into());
    header.extend(categories.names().map(str::to_string));
    header.push("Expected Rank".into());
    header.push("rank".into());

    let extra: Vec<String> = rows
        .iter()
        .filter_map(|r| r.standings.as_ref())
        .flat_map(|s| s.fields.keys().cloned())
        .filter(|k| !header.contains(k))
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(header.iter().chain(extra.iter()))?;

    for r in rows {
        let e = &r.expected;
        let mut record = vec![e.team.key.clone(), e.team.name.clone(), num(e.expected_points)];
        record.extend(
            categories
                .names()
                .map(|c| num(e.category_points.get(c).copied().unwrap_or(0.0))),
        );
        record.push(num(e.rank_sum));
        record.extend(
            categories
                .names()
                .map(|c| num(e.category_rank_sums.get(c).copied().unwrap_or(0.0))),
        );
        record.push(e.expected_rank.to_string());
        record.push(opt(r.rank()));
        record.extend(extra.iter().map(|k| r.field(k).unwrap_or("").to_string()));

        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_leaders_csv<W: io::Write>(out: W, leaders: &[LeaderRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["week", "stat", "teams", "val"])?;

    for l in leaders {
        writer.write_record([
            l.week.to_string(),
            l.category.clone(),
            l.joined_teams(),
            opt(l.value),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_stats_csv<W: io::Write>(
    out: W,
    records: &[TeamWeekRecord],
    categories: &CategoryTable,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["week", "matchup_id", "team_key", "team_id", "team_name", "result"];
    header.extend(categories.names());
    writer.write_record(&header)?;

    for r in records {
        let mut record = vec![
            r.week.to_string(),
            opt(r.matchup_id),
            r.team.key.clone(),
            r.team.id.clone(),
            r.team.name.clone(),
            r.result.code().to_string(),
        ];
        record.extend(categories.names().map(|c| opt(r.values.get(c))));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

// Writes next to the target and renames over it.
pub fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("csv.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn export_standings(path: &Path, rows: &[MergedRow], categories: &CategoryTable) -> Result<()> {
    let mut buffer = Vec::new();
    write_standings_csv(&mut buffer, rows, categories)?;
    write_file(path, &buffer)?;
    info!("Exported final standings to {}", path.display());
    Ok(())
}

pub fn export_leaders(path: &Path, leaders: &[LeaderRow]) -> Result<()> {
    let mut buffer = Vec::new();
    write_leaders_csv(&mut buffer, leaders)?;
    write_file(path, &buffer)?;
    info!("Exported {} leader records to {}", leaders.len(), path.display());
    Ok(())
}

pub fn export_stats(
    path: &Path,
    records: &[TeamWeekRecord],
    categories: &CategoryTable,
) -> Result<()> {
    let mut buffer = Vec::new();
    write_stats_csv(&mut buffer, records, categories)?;
    write_file(path, &buffer)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

pub fn print_standings(rows: &[MergedRow]) {
    for r in rows {
        println!("|{0:>4} | {1:25} | EP {2:7.1} | ER {3:3} | Rank Sum {4:7.1}",
            opt(r.rank()),
            r.expected.team.name,
            r.expected.expected_points,
            r.expected.expected_rank,
            r.expected.rank_sum,
        );
    }
}

pub fn print_leaders(leaders: &[LeaderRow]) {
    for l in leaders {
        println!("|Week {0:2} | {1:5} | {2:10} | {3}",
            l.week,
            l.category,
            opt(l.value),
            l.joined_teams(),
        );
    }
}

pub fn print_performance(performance: &[TeamPerformance]) {
    fn report_team(p: &TeamPerformance) {
        println!(
            "{0:25} | EP Share {1:6.4} | Win % {2:>5} | Exp. Rank {3:3} | Rank {4:>3} | Delta {5:>3}",
            p.team_name,
            p.expected_points_share,
            p.win_percentage.map(|w| format!("{:.3}", w)).unwrap_or_default(),
            p.expected_rank,
            opt(p.actual_rank),
            opt(p.rank_delta),
        );
    }

    for p in performance {
        report_team(p);
    }

    if let Some(error) = fit_error(performance) {
        println!("Mean absolute rank delta: {error:.2}");
    }
    for p in luckiest(performance, 1) {
        print!("Luckiest: ");
        report_team(p);
    }
    for p in unluckiest(performance, 1) {
        print!("Unluckiest: ");
        report_team(p);
    }
}
