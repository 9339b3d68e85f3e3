//! Publish command implementation
//!
//! Publishes every package, or only what one destination-relative path needs
//! when `--only` is given, then prints what was written.

use std::path::{Path, PathBuf};

use console::Style;

use grindstone::{Options, PublishReport, Publisher, Result};

/// Run publish command
pub fn run(options: Options) -> Result<()> {
    let publisher = Publisher::new(options)?;
    let dest = publisher.options().dest_folder.clone();

    match publisher.options().only_path.clone() {
        Some(only) => {
            let written = publisher.ensure_output(&only)?;
            print_only(&only, &written, &dest);
        }
        None => {
            let reports = publisher.make_all()?;
            print_reports(&reports, &dest);
        }
    }
    Ok(())
}

fn print_reports(reports: &[PublishReport], dest: &Path) {
    if reports.is_empty() {
        println!("No packages found.");
        return;
    }

    let name_style = Style::new().bold().yellow();
    let dim = Style::new().dim();
    for report in reports {
        if report.is_up_to_date() {
            println!(
                "  {} {}",
                name_style.apply_to(&report.package),
                dim.apply_to("up to date")
            );
        } else {
            println!(
                "  {} {} file(s) written",
                name_style.apply_to(&report.package),
                report.written.len()
            );
            for path in &report.written {
                println!("    {}", dim.apply_to(display_relative(path, dest)));
            }
        }
    }

    let total: usize = reports.iter().map(|r| r.written.len()).sum();
    println!();
    println!(
        "{} {} package(s), {} file(s) written",
        Style::new().bold().green().apply_to("Published"),
        reports.len(),
        total
    );
}

fn print_only(only: &str, written: &[PathBuf], dest: &Path) {
    for path in written {
        println!("    {}", Style::new().dim().apply_to(display_relative(path, dest)));
    }
    println!(
        "{} {} ({} file(s) written)",
        Style::new().bold().green().apply_to("Refreshed"),
        only,
        written.len()
    );
}

fn display_relative(path: &Path, dest: &Path) -> String {
    path.strip_prefix(dest)
        .unwrap_or(path)
        .display()
        .to_string()
}
