//! Deciding what to install.
//!
//! Selection happens once, before any pipeline starts, so pipelines never
//! block on a prompt.

use std::fmt;

use inquire::{Confirm, MultiSelect};
use rig_schema::{AppName, ApplicationSpec, Catalog};

use super::error::RunError;

/// The outcome of the selection step.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Applications to install, in catalog order.
    pub apps: Vec<ApplicationSpec>,
    /// Requested names that are not in the catalog.
    pub unknown: Vec<String>,
    /// Catalog entries the operator left unselected.
    pub not_selected: Vec<AppName>,
}

impl Selection {
    pub fn names(&self) -> Vec<AppName> {
        self.apps.iter().map(|a| a.name.clone()).collect()
    }
}

/// Every application in the catalog.
pub fn all(catalog: &Catalog) -> Selection {
    Selection {
        apps: catalog.apps().to_vec(),
        ..Selection::default()
    }
}

/// The named applications, deduplicated, in catalog order.
pub fn by_names(catalog: &Catalog, names: &[String]) -> Selection {
    let mut unknown = Vec::new();
    let mut wanted: Vec<AppName> = Vec::new();
    for raw in names {
        match catalog.find(raw) {
            Some(app) => {
                if !wanted.contains(&app.name) {
                    wanted.push(app.name.clone());
                }
            }
            None => {
                if !unknown.contains(raw) {
                    unknown.push(raw.clone());
                }
            }
        }
    }

    let apps = catalog
        .apps()
        .iter()
        .filter(|a| wanted.contains(&a.name))
        .cloned()
        .collect();
    Selection {
        apps,
        unknown,
        not_selected: Vec::new(),
    }
}

struct Choice<'a> {
    app: &'a ApplicationSpec,
    width: usize,
}

impl fmt::Display for Choice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} {:<width$} {}",
            self.app.category,
            self.app.name.as_str(),
            self.app.description,
            width = self.width
        )
    }
}

/// Multi-select over the catalog, grouped by category.
pub fn interactive(catalog: &Catalog) -> Result<Selection, RunError> {
    let width = catalog
        .apps()
        .iter()
        .map(|a| a.name.len())
        .max()
        .unwrap_or(0);
    let choices: Vec<Choice<'_>> = catalog
        .by_category()
        .into_values()
        .flatten()
        .map(|app| Choice { app, width })
        .collect();

    println!();
    let picked = MultiSelect::new("Select applications to install", choices)
        .with_page_size(15)
        .with_help_message("  ↑↓ navigate  space select  → all  ← none  type to filter  esc cancel")
        .prompt_skippable()?
        .ok_or(RunError::Cancelled)?;

    let chosen: Vec<AppName> = picked.iter().map(|c| c.app.name.clone()).collect();
    let (apps, rest): (Vec<_>, Vec<_>) = catalog
        .apps()
        .iter()
        .cloned()
        .partition(|a| chosen.contains(&a.name));

    Ok(Selection {
        apps,
        unknown: Vec::new(),
        not_selected: rest.into_iter().map(|a| a.name).collect(),
    })
}

/// Yes/no prompt. Escape counts as "no".
pub fn confirm(message: &str, default: bool) -> Result<bool, RunError> {
    Ok(Confirm::new(message)
        .with_default(default)
        .prompt_skippable()?
        .unwrap_or(false))
}

/// Rough wall-clock estimate for `count` applications.
pub fn estimate(count: usize, per_app_secs: u64, parallelism: usize) -> std::time::Duration {
    let waves = count.div_ceil(parallelism.max(1)) as u64;
    std::time::Duration::from_secs(waves * per_app_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn catalog() -> Catalog {
        Catalog::from_toml_str(
            r#"
            [[app]]
            name = "git"
            category = "Development"
            manager_a_id = "Git.Git"

            [[app]]
            name = "firefox"
            category = "Browsers"
            manager_b_id = "firefox"

            [[app]]
            name = "vlc"
            category = "Media"
            manager_b_id = "vlc"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn names_keep_catalog_order_and_report_unknowns() {
        let names = ["VLC", "git", "nope", "git", "nope"].map(String::from);
        let sel = by_names(&catalog(), &names);
        assert_eq!(sel.names(), vec![AppName::new("git"), AppName::new("vlc")]);
        assert_eq!(sel.unknown, vec!["nope"]);
    }

    #[test]
    fn all_selects_everything() {
        assert_eq!(all(&catalog()).apps.len(), 3);
    }

    #[test]
    fn estimate_accounts_for_parallelism() {
        assert_eq!(estimate(7, 60, 1), Duration::from_secs(420));
        assert_eq!(estimate(7, 60, 3), Duration::from_secs(180));
        assert_eq!(estimate(0, 60, 3), Duration::ZERO);
        assert_eq!(estimate(2, 60, 0), Duration::from_secs(120));
    }

    #[test]
    fn choices_render_as_aligned_rows() {
        let cat = catalog();
        let choice = Choice {
            app: &cat.apps()[0],
            width: 7,
        };
        assert_eq!(choice.to_string().trim_end(), "Development  git");
    }
}
