use anyhow::Result;
use comfy_table::{Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use rig_core::{Backend, PresenceChecker};
use rig_schema::{ApplicationSpec, Catalog};

use crate::Cli;
use crate::ops::{Exit, Session};

/// Print the catalog grouped by category.
pub async fn list(cli: &Cli, check: bool) -> Result<Exit> {
    let session = Session::open(cli);
    let catalog = &session.catalog;

    let installed = if check {
        let checker = PresenceChecker::new(session.runner.clone());
        let mut found = Vec::with_capacity(catalog.len());
        for app in catalog.apps() {
            found.push((app.name.clone(), checker.is_installed(app).await));
        }
        Some(found)
    } else {
        None
    };

    let status = |app: &ApplicationSpec| {
        installed.as_ref().map(|found| {
            found
                .iter()
                .any(|(name, yes)| *name == app.name && *yes)
        })
    };

    session.reporter.print(catalog_table(catalog, &status).to_string());
    session
        .reporter
        .print(format!("{} application(s)", catalog.len()));
    Ok(Exit::Ok)
}

/// Methods an application can be installed with, in the order they are tried.
fn methods(app: &ApplicationSpec) -> String {
    Backend::plan(app)
        .iter()
        .map(|b| b.kind().as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn catalog_table(catalog: &Catalog, status: &dyn Fn(&ApplicationSpec) -> Option<bool>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let checked = catalog.apps().first().is_some_and(|a| status(a).is_some());
    let mut header = vec!["Category", "Name", "Methods", "Description"];
    if checked {
        header.push("Installed");
    }
    table.set_header(header);

    for (category, apps) in catalog.by_category() {
        for (i, app) in apps.iter().enumerate() {
            let mut row = vec![
                Cell::new(if i == 0 { category } else { "" }),
                Cell::new(app.name.as_str()),
                Cell::new(methods(app)),
                Cell::new(&app.description),
            ];
            if let Some(present) = status(app) {
                row.push(Cell::new(if present {
                    "yes".green().to_string()
                } else {
                    "no".dark_grey().to_string()
                }));
            }
            table.add_row(row);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_toml_str(
            r#"
            [[app]]
            name = "git"
            category = "Development"
            description = "Version control"
            manager_a_id = "Git.Git"
            manager_b_id = "git"

            [[app]]
            name = "vscode"
            category = "Development"
            direct_url = "https://example.invalid/code.exe"

            [[app]]
            name = "steam"
            category = "Games"
            manual = true
            manual_url = "https://store.example.invalid/about"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn methods_follow_plan_order() {
        let cat = catalog();
        assert_eq!(methods(&cat.apps()[0]), "manager-a, manager-b");
        assert_eq!(methods(&cat.apps()[1]), "download");
        assert_eq!(methods(&cat.apps()[2]), "manual");
    }

    #[test]
    fn table_groups_by_category() {
        let text = catalog_table(&catalog(), &|_| None).to_string();
        assert_eq!(text.matches("Development").count(), 1);
        assert!(text.contains("Games"));
        assert!(text.contains("Version control"));
        assert!(!text.contains("Installed"));
    }

    #[test]
    fn check_adds_installed_column() {
        let text = catalog_table(&catalog(), &|app| Some(app.name == "git")).to_string();
        assert!(text.contains("Installed"));
        assert!(text.contains("yes"));
        assert!(text.contains("no"));
    }
}
