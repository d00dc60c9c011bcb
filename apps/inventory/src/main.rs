use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inventory_core::{Confirm, Dashboard};
use shared::{
    domain::{PageKind, ProductId, ProductPatch, RedirectTarget},
    protocol::{AuthForm, AuthFormKind, Outcome, ProductForm, RowAction, ViewModel},
};
use storage::Storage;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_database_url};

/// Local product inventory with sign-in, search, totals and JSON import/export.
#[derive(Parser, Debug)]
#[command(name = "inventory", version)]
struct Cli {
    /// Overrides the configured database url.
    #[arg(long)]
    database_url: Option<String>,
    /// Config file; defaults to ./inventory.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        price: String,
        #[arg(long, default_value = "")]
        qty: String,
    },
    /// Loads the product into the form, applies the given fields and submits it.
    Edit {
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Changes only the given fields.
    Update {
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    Clear {
        #[arg(long)]
        yes: bool,
    },
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// created_asc, created_desc, name_asc, name_desc, price_asc,
        /// price_desc, qty_asc or qty_desc.
        #[arg(long, default_value = "")]
        sort: String,
    },
    Totals,
    Export {
        /// Writes to stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Import {
        path: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct FieldArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    qty: Option<String>,
}

impl FieldArgs {
    fn apply_to(self, form: &mut ProductForm) {
        if let Some(v) = self.name {
            form.name = v;
        }
        if let Some(v) = self.category {
            form.category = v;
        }
        if let Some(v) = self.price {
            form.price = v;
        }
        if let Some(v) = self.qty {
            form.qty = v;
        }
    }

    fn into_patch(self) -> Result<ProductPatch> {
        let price = self
            .price
            .map(|raw| raw.trim().parse::<f64>())
            .transpose()
            .context("price must be a number")?;
        let qty = self
            .qty
            .map(|raw| raw.trim().parse::<i64>())
            .transpose()
            .context("quantity must be a whole number")?;
        Ok(ProductPatch {
            name: self.name,
            category: self.category,
            price,
            qty,
        })
    }
}

/// Prompts on stderr and reads the answer from stdin unless `--yes` was given.
struct CliConfirm {
    assume_yes: bool,
}

impl Confirm for CliConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = &cli.database_url {
        settings.database_url = normalize_database_url(url);
    }
    debug!(database_url = %settings.database_url, "opening inventory");

    let storage = Storage::new(&settings.database_url).await?;
    let assume_yes = matches!(
        cli.command,
        Command::Delete { yes: true, .. } | Command::Clear { yes: true }
    );
    let mut dashboard = Dashboard::open(
        storage,
        &settings.storage_keys(),
        settings.money_format(),
        CliConfirm { assume_yes },
    )
    .await?;

    let page = match &cli.command {
        Command::Register { .. } | Command::Login { .. } => Some(PageKind::Anonymous),
        Command::Logout | Command::Whoami => None,
        _ => Some(PageKind::Protected),
    };
    if let Some(page) = page {
        if let Some(target) = dashboard.open_page(page).await? {
            eprintln!("{}", redirect_hint(target));
            return Ok(ExitCode::FAILURE);
        }
    }

    let outcome = match cli.command {
        Command::Register {
            name,
            email,
            password,
        } => {
            dashboard
                .submit_auth_form(
                    AuthFormKind::Register,
                    AuthForm {
                        name,
                        email,
                        password,
                    },
                )
                .await?
        }
        Command::Login { email, password } => {
            dashboard
                .submit_auth_form(
                    AuthFormKind::Login,
                    AuthForm {
                        name: String::new(),
                        email,
                        password,
                    },
                )
                .await?
        }
        Command::Add {
            name,
            category,
            price,
            qty,
        } => {
            let form = ProductForm {
                name,
                category,
                price,
                qty,
            };
            dashboard.submit_product_form(form, None).await?
        }
        Command::Edit { id, fields } => {
            match dashboard.click_row(&ProductId(id), RowAction::Edit).await? {
                Outcome::EditForm {
                    editing_id,
                    mut form,
                    ..
                } => {
                    fields.apply_to(&mut form);
                    dashboard.submit_product_form(form, Some(editing_id)).await?
                }
                other => other,
            }
        }
        Command::Update { id, fields } => {
            let patch = fields.into_patch()?;
            dashboard.patch_product(&ProductId(id), patch).await?
        }
        Command::Delete { id, .. } => {
            dashboard
                .click_row(&ProductId(id), RowAction::Delete)
                .await?
        }
        Command::Clear { .. } => dashboard.click_clear_all().await?,
        Command::List { search, sort } => {
            dashboard.change_sort(&sort).await?;
            dashboard.change_search(search).await?
        }
        Command::Totals => {
            let view = dashboard.render();
            println!("Products: {}", view.total_count);
            println!("Stock value: {}", view.total_value);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Export { out } => match dashboard.click_export().await? {
            Outcome::Download(download) => {
                match out {
                    Some(path) => {
                        tokio::fs::write(&path, &download.bytes)
                            .await
                            .with_context(|| format!("failed to write '{}'", path.display()))?;
                        eprintln!("Exported to {}", path.display());
                    }
                    None => {
                        let mut stdout = io::stdout().lock();
                        stdout.write_all(&download.bytes)?;
                        writeln!(stdout)?;
                    }
                }
                return Ok(ExitCode::SUCCESS);
            }
            other => other,
        },
        Command::Import { path } => {
            let contents = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            dashboard.click_import(&contents).await?
        }
        Command::Logout => {
            let outcome = dashboard.click_logout().await?;
            eprintln!("Signed out");
            outcome
        }
        Command::Whoami => return whoami(&dashboard).await,
    };

    Ok(report(outcome))
}

async fn whoami<C: Confirm>(dashboard: &Dashboard<Storage, C>) -> Result<ExitCode> {
    match dashboard.session().current_session().await? {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("Not signed in");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report(outcome: Outcome) -> ExitCode {
    if let Some(notice) = outcome.notice() {
        if notice.is_error() {
            eprintln!("error: {}", notice.message);
        } else {
            eprintln!("{}", notice.message);
        }
    }

    match outcome {
        Outcome::Render { view, .. } => {
            print_table(&view);
            ExitCode::SUCCESS
        }
        Outcome::Redirect { target, .. } => {
            if target == RedirectTarget::Dashboard {
                eprintln!("Signed in");
            }
            ExitCode::SUCCESS
        }
        Outcome::Cancelled => {
            eprintln!("Cancelled");
            ExitCode::SUCCESS
        }
        Outcome::Rejected(_) => ExitCode::FAILURE,
        Outcome::EditForm { .. } | Outcome::Download(_) => ExitCode::SUCCESS,
    }
}

fn redirect_hint(target: RedirectTarget) -> &'static str {
    match target {
        RedirectTarget::AnonymousLanding => "Not signed in. Run `inventory login` first.",
        RedirectTarget::Dashboard => "Already signed in. Run `inventory logout` first.",
    }
}

fn print_table(view: &ViewModel) {
    if view.empty {
        println!("No products found");
    } else {
        let headers = ["#", "Name", "SKU", "Category", "Price", "Qty", "Value"];
        let cells: Vec<[String; 7]> = view
            .rows
            .iter()
            .map(|row| {
                let qty = if row.low_stock {
                    format!("{} (low)", row.qty)
                } else {
                    row.qty.to_string()
                };
                [
                    row.index.to_string(),
                    row.name.clone(),
                    row.sku.clone(),
                    row.category.clone(),
                    row.price.clone(),
                    qty,
                    row.value.clone(),
                ]
            })
            .collect();

        let mut widths = headers.map(|h| h.chars().count());
        for line in &cells {
            for (width, cell) in widths.iter_mut().zip(line) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let header_cells = headers.map(String::from);
        for line in std::iter::once(&header_cells).chain(cells.iter()) {
            let padded: Vec<String> = line
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect();
            println!("{}", padded.join("  ").trim_end());
        }
    }
    println!(
        "Total products: {}  Stock value: {}",
        view.total_count, view.total_value
    );
}
