use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use dialoguer::{Confirm, MultiSelect};
use indicatif::{ProgressBar, ProgressStyle};
use orphansweep::category::ExclusionPolicy;
use orphansweep::reconcile::{Orphan, OrphanPartition};
use orphansweep::selection::{self, Selection};
use orphansweep::size::{self, format_size};
use orphansweep::{cleaner, inventory, reconcile, scanner};
use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orphansweep")]
#[command(about = "Find and remove downloads that your torrent client no longer tracks")]
#[command(version)]
struct Cli {
    /// Download root to reconcile
    path: PathBuf,

    /// JSON dump of the client's torrents/info (`-` reads stdin)
    #[arg(short, long)]
    inventory: PathBuf,

    /// Category folder whose orphans are never deleted by default (repeatable)
    #[arg(short = 'x', long = "exclude-category", value_name = "CATEGORY")]
    exclude_categories: Vec<String>,

    /// Do not exclude the ISOs category by default
    #[arg(long)]
    no_default_exclusions: bool,

    /// Show what would be deleted without deleting
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Print the orphan partition as JSON and exit
    #[arg(long, conflicts_with_all = ["dry_run", "script"])]
    json: bool,

    /// Print a shell script removing the deletable orphans instead of deleting
    #[arg(long, conflicts_with = "dry_run")]
    script: bool,

    /// Positions in the deletable list to keep, e.g. "1,4" or "none"
    #[arg(short, long, value_name = "LIST")]
    exclude: Option<String>,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    yes: bool,

    /// Log each stage of the run
    #[arg(short, long)]
    verbose: bool,
}

/// Everything a run needs, resolved up front.
struct Config {
    root: PathBuf,
    inventory: PathBuf,
    policy: ExclusionPolicy,
}

impl Cli {
    fn config(&self) -> Config {
        let base = if self.no_default_exclusions {
            ExclusionPolicy::none()
        } else {
            ExclusionPolicy::default()
        };
        let policy = self
            .exclude_categories
            .iter()
            .fold(base, |policy, category| policy.with(category.as_str()));

        Config {
            root: self.path.clone(),
            inventory: self.inventory.clone(),
            policy,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn size_label(sizes: &HashMap<Orphan, Option<u64>>, orphan: &Orphan) -> String {
    match sizes.get(orphan).copied().flatten() {
        Some(bytes) => format_size(bytes),
        None => "unknown".to_string(),
    }
}

fn build_display_item(orphan: &Orphan, size: &str, max_name_len: usize) -> String {
    format!(
        "{:<width$}  {:>10}  {}",
        orphan.name,
        size,
        format!("[{}]", orphan.category),
        width = max_name_len
    )
}

fn print_listing(title: &str, orphans: &[Orphan], sizes: &HashMap<Orphan, Option<u64>>, width: usize) {
    println!("\n{}", title.bold());
    for (i, orphan) in orphans.iter().enumerate() {
        println!(
            "  {:>3}. {:<width$}  {:>10}  {}",
            i + 1,
            orphan.name,
            size_label(sizes, orphan),
            format!("[{}]", orphan.category).dimmed(),
            width = width
        );
    }
}

fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

/// Shell script removing `items`; only the header when there is nothing to remove.
fn render_script(items: &[Orphan], root: &Path) -> String {
    let mut script = String::from("#!/bin/bash\n");
    for orphan in items {
        let path = orphan.category.resolve(root, &orphan.name);
        script.push_str(&format!("rm -rf {}\n", shell_quote(&path)));
    }
    script
}

/// Prompts need a terminal on both ends; stdin may carry the inventory.
fn can_prompt() -> bool {
    console::user_attended() && std::io::stdin().is_terminal()
}

fn confirm(prompt: String) -> Result<bool> {
    if !can_prompt() {
        bail!("refusing to prompt without a terminal; pass --yes to confirm");
    }
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

fn apply_exclude_list(list: &str, partition: &OrphanPartition) -> Result<Vec<Orphan>> {
    let excluded = selection::parse_exclusions(list, partition.deletable.len())
        .context("invalid --exclude list")?;
    Ok(selection::final_deletion_list(&partition.deletable, &excluded))
}

/// Chooses what to delete: an explicit exclusion list, the defaults under
/// `--yes`, or an interactive pick over every orphan.
fn choose(cli: &Cli, partition: &OrphanPartition, sizes: &HashMap<Orphan, Option<u64>>, width: usize) -> Result<Option<Vec<Orphan>>> {
    if let Some(list) = &cli.exclude {
        return apply_exclude_list(list, partition).map(Some);
    }

    let selection = Selection::from_partition(partition);
    if cli.yes {
        return Ok(Some(selection.checked()));
    }
    if !can_prompt() {
        bail!("refusing to prompt without a terminal; pass --yes or --exclude");
    }

    let items: Vec<String> = selection
        .candidates()
        .iter()
        .map(|c| build_display_item(&c.orphan, &size_label(sizes, &c.orphan), width))
        .collect();

    println!("\nUse {} to toggle, {} to confirm:\n", "Space".cyan(), "Enter".cyan());

    match MultiSelect::new()
        .items(&items)
        .defaults(&selection.defaults())
        .interact()
    {
        Ok(indices) => Ok(Some(selection.picked(&indices))),
        Err(_) => Ok(None),
    }
}

/// Runs one reconciliation. Returns whether every requested deletion succeeded.
fn run(cli: &Cli) -> Result<bool> {
    let config = cli.config();
    let root = &config.root;

    eprintln!("{} {}...", "Scanning".cyan().bold(), root.display());
    let scan = scanner::scan(root)?;
    for skipped in &scan.skipped_categories {
        eprintln!("{} cannot access {}", "warning:".yellow().bold(), skipped.display());
    }
    eprintln!(
        "Scanned {} category folders, found {} total items",
        scan.category_count,
        scan.entries.len()
    );

    let tracked = inventory::load_inventory(&config.inventory)
        .with_context(|| format!("cannot load inventory from {}", config.inventory.display()))?;
    let expected = inventory::expected_names(&tracked);
    eprintln!("Found {} torrents in the client inventory", tracked.len());

    let partition = reconcile::reconcile(&scan.entries, &expected, &config.policy);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&partition)?);
        return Ok(true);
    }

    if cli.script {
        let items = match &cli.exclude {
            Some(list) => apply_exclude_list(list, &partition)?,
            None => partition.deletable.clone(),
        };
        print!("{}", render_script(&items, root));
        return Ok(true);
    }

    if partition.is_empty() {
        println!("{}", "No orphaned files found.".green());
        return Ok(true);
    }

    let sizes: HashMap<Orphan, Option<u64>> = partition
        .excluded
        .iter()
        .chain(&partition.deletable)
        .map(|o| (o.clone(), size::entry_size(&o.category.resolve(root, &o.name))))
        .collect();
    let width = sizes.keys().map(|o| o.name.len()).max().unwrap_or(40);

    println!(
        "\nFound {} orphaned items",
        partition.len().to_string().green().bold()
    );
    if !partition.excluded.is_empty() {
        let categories: Vec<&str> = config.policy.categories().collect();
        print_listing(
            &format!("Excluded from deletion by default ({}):", categories.join(", ")),
            &partition.excluded,
            &sizes,
            width,
        );
    }
    if !partition.deletable.is_empty() {
        print_listing("Available for deletion:", &partition.deletable, &sizes, width);
    }

    if cli.dry_run {
        println!("\n{}", "Dry run - nothing will be deleted.".yellow());
        return Ok(true);
    }

    let Some(to_delete) = choose(cli, &partition, &sizes, width)? else {
        println!("\n{}", "Cancelled.".yellow());
        return Ok(true);
    };

    if to_delete.is_empty() {
        println!("\n{}", "Nothing selected.".yellow());
        return Ok(true);
    }

    println!("\n{} ({} items):", "Final deletion list".red().bold(), to_delete.len());
    for orphan in &to_delete {
        println!("  • {}", orphan);
    }

    if !cli.yes {
        let prompt = format!(
            "Permanently delete {} items from {}?",
            to_delete.len(),
            root.display()
        );
        if !confirm(prompt)? {
            println!("{}", "Operation cancelled.".yellow());
            return Ok(true);
        }
    }

    info!(items = to_delete.len(), "starting deletion");
    let progress = ProgressBar::new(to_delete.len() as u64);
    progress.set_style(ProgressStyle::with_template(
        "{spinner} {bar:40.red/white} {pos}/{len} {wide_msg}",
    )?);
    let outcome = cleaner::delete_selected_with(&to_delete, root, |orphan| {
        progress.set_message(orphan.name.clone());
        progress.inc(1);
    });
    progress.finish_and_clear();

    if !outcome.error_messages.is_empty() {
        println!("\n{}", "Failed to delete:".red());
        for message in &outcome.error_messages {
            println!("  {}", message);
        }
    }

    let freed: u64 = outcome
        .deleted
        .iter()
        .filter_map(|o| sizes.get(o).copied().flatten())
        .sum();
    println!(
        "\n{} Deleted {} items ({}), {} errors",
        "Done!".green().bold(),
        outcome.deleted_count.to_string().green(),
        format_size(freed).green().bold(),
        outcome.error_count.to_string().red()
    );

    Ok(outcome.is_clean())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orphansweep::category::Category;

    #[test]
    fn config_merges_default_and_extra_exclusions() {
        let cli = Cli::parse_from(["orphansweep", "/dl", "-i", "inv.json", "-x", "Games"]);
        let config = cli.config();

        assert_eq!(config.root, PathBuf::from("/dl"));
        assert_eq!(config.policy.categories().collect::<Vec<_>>(), vec!["Games", "ISOs"]);
    }

    #[test]
    fn config_can_drop_default_exclusions() {
        let cli = Cli::parse_from(["orphansweep", "/dl", "-i", "-", "--no-default-exclusions"]);
        let config = cli.config();

        assert_eq!(config.inventory, PathBuf::from("-"));
        assert!(!config.policy.excludes(&Category::Folder("ISOs".into())));
    }

    #[test]
    fn json_conflicts_with_dry_run() {
        let result = Cli::try_parse_from(["orphansweep", "/dl", "-i", "x", "--json", "-n"]);
        assert!(result.is_err());
    }

    #[test]
    fn script_quotes_paths() {
        let path = Path::new("/dl/Movies/it's.mkv");
        assert_eq!(shell_quote(path), r"'/dl/Movies/it'\''s.mkv'");
    }

    #[test]
    fn script_without_orphans_is_only_the_header() {
        assert_eq!(render_script(&[], Path::new("/dl")), "#!/bin/bash\n");
    }

    #[test]
    fn script_lists_one_removal_per_orphan() {
        let items = vec![
            Orphan::new("doc.pdf", Category::Root),
            Orphan::new("movie1", Category::Folder("Movies".into())),
        ];

        assert_eq!(
            render_script(&items, Path::new("/dl")),
            "#!/bin/bash\nrm -rf '/dl/doc.pdf'\nrm -rf '/dl/Movies/movie1'\n"
        );
    }
}
