//! Interactive browse flow.
//!
//! Search, pick an app, choose an install method and confirm.
//! Uses dialoguer for terminal UI prompts.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

use hystore_core::catalog::{SearchSortView, SortOption};
use hystore_core::install::{InstallMethod, target_url};
use hystore_core::source::AppRecord;

/// Pre-filled values from CLI args that skip prompts.
#[derive(Debug, Clone, Default)]
pub struct PrefilledBrowse {
    /// Search query - if Some, skip search prompt
    pub query: Option<String>,
    /// Sort order - if Some, skip sort prompt
    pub sort: Option<SortOption>,
    /// Install method - if Some, skip method prompt
    pub method: Option<InstallMethod>,
    /// Skip confirmation
    pub yes: bool,
}

/// Result of the browse flow.
#[derive(Debug, Clone)]
pub struct BrowseSelection {
    pub app: AppRecord,
    pub method: InstallMethod,
    /// Whether the user confirmed the install
    pub confirmed: bool,
}

pub struct BrowseFlow<W: Write = io::Stdout> {
    view: SearchSortView,
    /// Method preselected in the method prompt
    preferred: InstallMethod,
    prefilled: PrefilledBrowse,
    /// Output writer (for testing)
    writer: W,
    theme: ColorfulTheme,
}

impl BrowseFlow<io::Stdout> {
    pub fn new(view: SearchSortView, preferred: InstallMethod, prefilled: PrefilledBrowse) -> Self {
        Self {
            view,
            preferred,
            prefilled,
            writer: io::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<W: Write> BrowseFlow<W> {
    /// Create a flow with a custom writer (for testing).
    #[cfg(test)]
    pub fn with_writer(
        view: SearchSortView,
        preferred: InstallMethod,
        prefilled: PrefilledBrowse,
        writer: W,
    ) -> Self {
        Self {
            view,
            preferred,
            prefilled,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    /// Run the flow. `None` when nothing matches the search.
    ///
    /// Flow:
    /// 1. Search query (empty shows everything)
    /// 2. Sort order
    /// 3. Pick an app (skipped when exactly one matches)
    /// 4. Install method
    /// 5. Show summary and confirm
    pub fn collect(&mut self) -> Result<Option<BrowseSelection>> {
        self.print_header()?;

        let query = self.prompt_query()?;
        self.view.set_query(query);

        let sort = self.prompt_sort()?;
        self.view.set_sort(sort);

        let Some(app) = self.prompt_app()? else {
            writeln!(
                self.writer,
                "  No apps match '{}'.",
                style(self.view.query()).yellow()
            )?;
            return Ok(None);
        };

        let method = self.prompt_method()?;
        let confirmed = self.show_summary_and_confirm(&app, method)?;

        Ok(Some(BrowseSelection {
            app,
            method,
            confirmed,
        }))
    }

    fn print_header(&mut self) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  HyStore").bold().cyan())?;
        writeln!(
            self.writer,
            "  {} apps from all repositories",
            self.view.catalog().len()
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn prompt_query(&self) -> Result<String> {
        if let Some(query) = &self.prefilled.query {
            return Ok(query.clone());
        }

        let query: String = Input::with_theme(&self.theme)
            .with_prompt("Search apps")
            .allow_empty(true)
            .interact_text()?;
        Ok(query)
    }

    fn prompt_sort(&self) -> Result<SortOption> {
        if let Some(sort) = self.prefilled.sort {
            return Ok(sort);
        }

        let options = vec!["Default", "Alphabetical"];
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Sort by")
            .items(&options)
            .default(0)
            .interact()?;

        Ok(match selection {
            0 => SortOption::Default,
            _ => SortOption::Alphabetical,
        })
    }

    fn prompt_app(&self) -> Result<Option<AppRecord>> {
        let records = self.view.records();

        match records.len() {
            0 => Ok(None),
            1 => Ok(Some(records[0].clone())),
            _ => {
                let items: Vec<String> = records.iter().map(|app| app_line(app)).collect();
                let selection = Select::with_theme(&self.theme)
                    .with_prompt("Select app")
                    .items(&items)
                    .default(0)
                    .max_length(15)
                    .interact()?;

                Ok(Some(records[selection].clone()))
            }
        }
    }

    fn prompt_method(&self) -> Result<InstallMethod> {
        if let Some(method) = self.prefilled.method {
            return Ok(method);
        }

        let labels: Vec<_> = InstallMethod::ALL.iter().map(|m| m.label()).collect();
        let default = InstallMethod::ALL
            .iter()
            .position(|m| *m == self.preferred)
            .unwrap_or(0);
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Install with")
            .items(&labels)
            .default(default)
            .interact()?;

        Ok(InstallMethod::ALL[selection])
    }

    fn show_summary_and_confirm(&mut self, app: &AppRecord, method: InstallMethod) -> Result<bool> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  Summary").bold())?;
        writeln!(self.writer, "  ───────────────────────────")?;
        writeln!(self.writer, "  App:       {}", style(&app.name).green())?;
        if let Some(version) = app.latest_version() {
            writeln!(self.writer, "  Version:   {}", style(version).green())?;
        }
        if let Some(developer) = &app.developer_name {
            writeln!(self.writer, "  Developer: {}", style(developer).green())?;
        }
        if let Some(size) = app.display_size() {
            writeln!(self.writer, "  Size:      {}", style(size).green())?;
        }
        writeln!(self.writer, "  Source:    {}", style(&app.source_name).green())?;
        writeln!(self.writer, "  Method:    {}", style(method.label()).green())?;

        let Some(download_url) = app.effective_download_url() else {
            writeln!(
                self.writer,
                "  {}",
                style("This app has no download URL.").red()
            )?;
            writeln!(self.writer)?;
            return Ok(false);
        };
        writeln!(
            self.writer,
            "  Target:    {}",
            style(target_url(download_url, method)).dim()
        )?;
        writeln!(self.writer)?;

        if self.prefilled.yes {
            return Ok(true);
        }

        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(format!("Install {}?", app.name))
            .default(true)
            .interact()?;

        Ok(confirmed)
    }
}

fn app_line(app: &AppRecord) -> String {
    match app.latest_version() {
        Some(version) => format!("{} {}  ({})", app.name, version, app.source_name),
        None => format!("{}  ({})", app.name, app.source_name),
    }
}
