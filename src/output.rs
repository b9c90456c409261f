use console::Style;

use crate::stats::Aggregator;

pub fn print_error(msg: &str) {
    let style = Style::new().red().bold();
    eprintln!("{} {}", style.apply_to("✗"), msg);
}

/// End-of-run report: per-file scores, the overall score, surviving mutants,
/// and duplicate-kill candidates.
pub fn print_report(aggregator: &Aggregator) {
    for (file, stats) in aggregator.files() {
        println!("{}: {}", file, stats.summary());
        if stats.errored > 0 {
            let dim = Style::new().dim();
            println!(
                "  {} {} mutants dropped by errors",
                dim.apply_to("·"),
                stats.errored
            );
        }
    }

    let overall = aggregator.overall();
    let style = if overall.failed == 0 {
        Style::new().green().bold()
    } else {
        Style::new().yellow().bold()
    };
    println!("{} overall, {}", style.apply_to("→"), overall.summary());

    let live = aggregator.live_mutants();
    if !live.is_empty() {
        println!();
        let style = Style::new().yellow().bold();
        println!("{} surviving mutants:", style.apply_to("!"));
        for mutant in live {
            println!("  {}", mutant);
        }
    }

    let redundant = aggregator.redundant_candidates();
    if !redundant.is_empty() {
        println!();
        let style = Style::new().cyan().bold();
        println!(
            "{} candidate redundant mutants (killed by the same failing tests):",
            style.apply_to("≈")
        );
        for (tests, mutants) in redundant {
            println!("  [{}]", tests);
            for mutant in mutants {
                println!("    {}", mutant);
            }
        }
    }
}
