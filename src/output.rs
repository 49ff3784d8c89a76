use std::io::{self, Write};

use colored::Colorize;

use crate::harbor::RawResponse;
use crate::models::{DeletionSummary, ScoredRepository};
use crate::prompt::MAX_DELETE_COUNT;
use crate::tag_retention::{TagAge, TagPrunePlan, TagRetentionArgs, TagRetentionSummary};

pub fn print_public_repo_count<W: Write>(out: &mut W, count: u64) -> io::Result<()> {
    writeln!(out, "Current public repository count: {}", count.to_string().bold())
}

/// Print scored repositories, lowest score (first to go) on top
pub fn print_ranking<W: Write>(out: &mut W, ranking: &[ScoredRepository]) -> io::Result<()> {
    writeln!(
        out,
        "\n{}",
        "Public repositories ranked by score (low to high), deletion candidates first:".bold()
    )?;
    writeln!(out, "{}", "─".repeat(60))?;

    if ranking.is_empty() {
        return writeln!(out, "  {}", "No public repositories found.".green());
    }

    for scored in ranking {
        let repo = &scored.repository;
        writeln!(
            out,
            "  {} {:<40} {} {}",
            format!("{:.2}", scored.score).yellow().bold(),
            repo.name,
            format!("pulls={} tags={}", repo.pull_count, repo.tags_count).dimmed(),
            repo.update_time.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed(),
        )?;
    }
    Ok(())
}

pub fn print_count_rejected<W: Write>(out: &mut W, count: i64) -> io::Result<()> {
    writeln!(
        out,
        "{} The valid number range is (0, {}], got {}.",
        "WARNING:".yellow().bold(),
        MAX_DELETE_COUNT,
        count
    )?;
    writeln!(out, "{} Not allowed to proceed, aborting.", "WARNING:".yellow().bold())
}

pub fn print_soft_deletion_start<W: Write>(out: &mut W, count: usize) -> io::Result<()> {
    writeln!(out, "\n{} up to {} repositories", "SOFT DELETION:".bold(), count)?;
    writeln!(out, "{}", "─".repeat(60))
}

pub fn print_deletion_summary<W: Write>(out: &mut W, summary: &DeletionSummary) -> io::Result<()> {
    for name in &summary.deleted {
        writeln!(out, "  [{}] {}", "DELETED".red().bold(), name)?;
    }
    for name in &summary.failed {
        writeln!(out, "  [{}] {}", " FAILED".yellow().bold(), name)?;
    }
    writeln!(out, "\n{}", "═".repeat(60))?;
    writeln!(
        out,
        "{} Soft deleted {} repositories, {} failed",
        "SUMMARY:".bold(),
        summary.deleted.len().to_string().red().bold(),
        failure_count(summary.failed.len()),
    )?;
    if !summary.failed.is_empty() {
        writeln!(out, "Re-run to retry the failed deletions.")?;
    }
    Ok(())
}

/// Soft deletion only marks records; storage comes back after a registry GC
pub fn print_gc_hint<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "─".repeat(60))?;
    writeln!(
        out,
        "{} To actually release disk space you still need to:",
        "REMINDER:".yellow().bold()
    )?;
    writeln!(out, "1. Change into the Harbor installation directory (e.g. /opt/apps/harbor/)")?;
    writeln!(out, "2. Preview which files/images would be removed:")?;
    writeln!(out, "    a. docker-compose stop")?;
    writeln!(out, "    b. docker run -it --name gc --rm --volumes-from registry vmware/registry:2.6.2-photon garbage-collect --dry-run /etc/registry/config.yml")?;
    writeln!(out, "3. Run the real garbage collection:")?;
    writeln!(out, "    a. docker run -it --name gc --rm --volumes-from registry vmware/registry:2.6.2-photon garbage-collect /etc/registry/config.yml")?;
    writeln!(out, "    b. docker-compose start")?;
    writeln!(out)?;
    writeln!(
        out,
        "{} Make sure nobody pushes images while GC runs. Layers of an image pushed \
         during GC may be deleted by mistake, leaving a corrupted image. Stop Harbor first.",
        "WARNING:".red().bold()
    )?;
    writeln!(out, "{}", "─".repeat(60))
}

pub fn print_tag_run_header(args: &TagRetentionArgs) {
    match &args.repo_name {
        Some(name) => println!(
            "Tag retention on repository {}, untouched days: {}, old tags kept: {}",
            name.bold(),
            args.day,
            args.max
        ),
        None => println!(
            "Tag retention on {}, untouched days: {}, old tags kept: {}",
            "all repositories".bold(),
            args.day,
            args.max
        ),
    }
}

pub fn print_no_repositories(repo_name: Option<&str>) {
    match repo_name {
        Some(name) => println!("  {}", format!("No repository named {}.", name).green()),
        None => println!("  {}", "No repositories found.".green()),
    }
}

pub fn print_repo_header(name: &str, tags_count: i64) {
    println!("\nRepository: {} (tags_count: {})", name.bold(), tags_count);
    println!("{}", "─".repeat(60));
}

pub fn print_tag_plan(plan: &TagPrunePlan, args: &TagRetentionArgs) {
    println!(
        "  tags within {} days: {}, tags older than {} days: {}",
        args.day,
        plan.young.len(),
        args.day,
        plan.old_count()
    );

    for tag in &plan.young {
        print_tag_line(tag, "YOUNG");
    }
    for tag in &plan.kept {
        print_tag_line(tag, "KEEP");
    }
    for tag in &plan.to_delete {
        print_tag_line(tag, "DELETE");
    }

    if plan.to_delete.is_empty() {
        println!(
            "  {}",
            format!(
                "{} old tags is within the cap of {}, nothing to delete.",
                plan.old_count(),
                args.max
            )
            .green()
        );
    } else {
        println!(
            "  {} old tags exceed the cap of {}, deleting {}.",
            plan.old_count(),
            args.max,
            plan.to_delete.len().to_string().red().bold()
        );
    }
}

fn print_tag_line(tag: &TagAge, action: &str) {
    let label = match action {
        "DELETE" => "DELETE".red().bold().to_string(),
        "KEEP" => "  KEEP".green().bold().to_string(),
        _ => format!("{:>6}", action).dimmed().to_string(),
    };

    println!(
        "    [{}] {:<30} {} {}",
        label,
        tag.tag.name,
        tag.tag.created.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed(),
        format!("{:.1} days", tag.age_days).dimmed(),
    );
}

pub fn print_tag_summary(summary: &TagRetentionSummary) {
    println!("\n{}", "═".repeat(60));
    println!(
        "{} Scanned {} repositories, deleted {} tags, {} failed",
        "SUMMARY:".bold(),
        summary.repositories_scanned,
        summary.deletions.deleted.len().to_string().red().bold(),
        failure_count(summary.deletions.failed.len()),
    );
    for label in &summary.deletions.failed {
        println!("  [{}] {}", " FAILED".yellow().bold(), label);
    }
}

/// Status and body of a passthrough request
pub fn print_raw(raw: &RawResponse) {
    let status = raw.status.to_string();
    let status = if raw.status.is_success() {
        status.green()
    } else {
        status.red()
    };
    println!("<== Rsp Status: {}", status);
    println!("<== Rsp Body: {}", raw.body);
}

fn failure_count(failed: usize) -> String {
    if failed > 0 {
        failed.to_string().red().bold().to_string()
    } else {
        failed.to_string()
    }
}
