//! Result rendering: projects ordered records into rows, selection state and
//! print controls.
//!
//! The view never reaches out to the gateway or the printer itself. Control
//! activations are dispatched to a caller-supplied [`ResultHandlers`].

use crate::print::{Notice, PrintKind};
use crate::record::{Record, Vitality};
use std::collections::HashSet;

/// Placeholder for a missing entry number.
pub const MISSING_ENTRY: &str = "N/A";
/// Placeholder for any other missing field.
pub const MISSING_FIELD: &str = "-";

/// Receives the results pane's control activations.
pub trait ResultHandlers {
    /// A row's print action was activated.
    fn print_single(&mut self, entry: &str, kind: PrintKind);
    /// The batch-print control was activated with these checked entries.
    fn print_batch(&mut self, entries: Vec<String>);
    /// Something the user should be told about.
    fn report(&mut self, notice: Notice);
}

/// Print actions offered on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowActions {
    /// Born at the centre: only the captive-birth form is offered
    CaptiveBirth,
    /// Clinical and post-mortem records, one of them emphasized
    ClinicalAndPostMortem { emphasized: PrintKind },
}

impl RowActions {
    fn for_record(record: &Record, vitality: Vitality) -> Self {
        if record.is_captive_born() {
            RowActions::CaptiveBirth
        } else {
            RowActions::ClinicalAndPostMortem {
                emphasized: match vitality {
                    Vitality::Alive => PrintKind::Clinical,
                    Vitality::Deceased => PrintKind::PostMortem,
                },
            }
        }
    }

    /// Actions in display order.
    pub fn kinds(self) -> Vec<PrintKind> {
        match self {
            RowActions::CaptiveBirth => vec![PrintKind::CaptiveBirth],
            RowActions::ClinicalAndPostMortem { .. } => {
                vec![PrintKind::Clinical, PrintKind::PostMortem]
            }
        }
    }

    /// The action a plain "print" on this row runs.
    pub fn primary(self) -> PrintKind {
        match self {
            RowActions::CaptiveBirth => PrintKind::CaptiveBirth,
            RowActions::ClinicalAndPostMortem { emphasized } => emphasized,
        }
    }

    pub fn is_emphasized(self, kind: PrintKind) -> bool {
        self.primary() == kind
    }

    pub fn offers(self, kind: PrintKind) -> bool {
        self.kinds().contains(&kind)
    }
}

/// Which row print control the user reached for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPrintChoice {
    Primary,
    Kind(PrintKind),
}

/// One displayed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub entry: Option<String>,
    pub date: String,
    pub species: String,
    pub municipality: String,
    pub completed_by: String,
    pub vitality: Vitality,
    pub actions: RowActions,
}

impl RowView {
    pub fn from_record(record: &Record) -> Self {
        let text = |field: &Option<String>| {
            field
                .clone()
                .unwrap_or_else(|| MISSING_FIELD.to_string())
        };
        let vitality = record.vitality();

        Self {
            entry: record.entry_number.clone(),
            date: text(&record.date),
            species: text(&record.species_common),
            municipality: text(&record.municipality),
            completed_by: text(&record.completed_by),
            vitality,
            actions: RowActions::for_record(record, vitality),
        }
    }

    pub fn entry_label(&self) -> &str {
        self.entry.as_deref().unwrap_or(MISSING_ENTRY)
    }
}

/// Checked entry numbers. Lives exactly as long as the table it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    checked: HashSet<String>,
}

impl Selection {
    pub fn is_checked(&self, entry: &str) -> bool {
        self.checked.contains(entry)
    }

    pub fn len(&self) -> usize {
        self.checked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checked.is_empty()
    }

    fn set(&mut self, entry: &str, checked: bool) {
        if checked {
            self.checked.insert(entry.to_string());
        } else {
            self.checked.remove(entry);
        }
    }
}

/// A rendered, non-empty result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsTable {
    rows: Vec<RowView>,
    selection: Selection,
    cursor: usize,
}

impl ResultsTable {
    fn new(rows: Vec<RowView>) -> Self {
        Self {
            rows,
            selection: Selection::default(),
            cursor: 0,
        }
    }

    pub fn rows(&self) -> &[RowView] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> String {
        format!("Records found: {}", self.rows.len())
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_row(&self) -> Option<&RowView> {
        self.rows.get(self.cursor)
    }

    pub fn is_row_checked(&self, index: usize) -> bool {
        self.rows
            .get(index)
            .and_then(|row| row.entry.as_deref())
            .is_some_and(|entry| self.selection.is_checked(entry))
    }

    /// State of the header checkbox: every selectable row is checked.
    pub fn all_checked(&self) -> bool {
        let mut selectable = self.rows.iter().filter_map(|row| row.entry.as_deref()).peekable();
        selectable.peek().is_some() && selectable.all(|entry| self.selection.is_checked(entry))
    }

    /// Header checkbox: check or uncheck every row.
    pub fn toggle_all(&mut self, checked: bool) {
        for row in &self.rows {
            if let Some(entry) = &row.entry {
                self.selection.set(entry, checked);
            }
        }
    }

    /// Flip the checkbox of row `index`. Rows without an entry number cannot
    /// be selected.
    pub fn toggle_row(&mut self, index: usize) {
        if let Some(entry) = self.rows.get(index).and_then(|row| row.entry.clone()) {
            let checked = self.selection.is_checked(&entry);
            self.selection.set(&entry, !checked);
        }
    }

    /// Entries currently checked, in row order, each once.
    pub fn checked_entries(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|row| row.entry.as_deref())
            .filter(|entry| self.selection.is_checked(entry) && seen.insert(*entry))
            .map(str::to_string)
            .collect()
    }

    pub fn move_cursor_up(&mut self, rows: usize) {
        self.cursor = self.cursor.saturating_sub(rows);
    }

    pub fn move_cursor_down(&mut self, rows: usize) {
        self.cursor = (self.cursor + rows).min(self.rows.len().saturating_sub(1));
    }

    pub fn go_to_first(&mut self) {
        self.cursor = 0;
    }

    pub fn go_to_last(&mut self) {
        self.cursor = self.rows.len().saturating_sub(1);
    }

    /// Batch-print control. Reads the checkboxes at activation time.
    pub fn activate_batch_print(&self, handlers: &mut dyn ResultHandlers) {
        let entries = self.checked_entries();
        if entries.is_empty() {
            handlers.report(Notice::NothingSelected);
        } else {
            handlers.print_batch(entries);
        }
    }

    /// A print control on row `index`.
    pub fn activate_row_action(
        &self,
        index: usize,
        choice: RowPrintChoice,
        handlers: &mut dyn ResultHandlers,
    ) {
        let Some(row) = self.rows.get(index) else {
            return;
        };
        let Some(entry) = row.entry.as_deref() else {
            handlers.report(Notice::Failed {
                message: "This record has no entry number".to_string(),
            });
            return;
        };

        let kind = match choice {
            RowPrintChoice::Primary => row.actions.primary(),
            RowPrintChoice::Kind(kind) if row.actions.offers(kind) => kind,
            RowPrintChoice::Kind(kind) => {
                handlers.report(Notice::info(format!(
                    "No {} for entry {}: only the {} is available",
                    kind,
                    entry,
                    row.actions.primary()
                )));
                return;
            }
        };
        handlers.print_single(entry, kind);
    }
}

/// What the results area shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultsPane {
    /// Nothing searched yet
    #[default]
    Idle,
    /// A search is in flight
    Loading,
    /// The search matched nothing
    NoResults,
    Table(ResultsTable),
    /// Records could not be loaded
    Failed { message: String },
}

impl ResultsPane {
    pub fn table(&self) -> Option<&ResultsTable> {
        match self {
            ResultsPane::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn table_mut(&mut self) -> Option<&mut ResultsTable> {
        match self {
            ResultsPane::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ResultsPane::Failed {
            message: message.into(),
        }
    }
}

/// Guidance shown under a load failure.
pub const LOAD_FAILURE_HINT: &str =
    "Make sure the gateway web app is deployed, reachable and shared with this account";

/// Build the pane for an ordered result set.
pub fn render(records: &[&Record]) -> ResultsPane {
    if records.is_empty() {
        return ResultsPane::NoResults;
    }
    ResultsPane::Table(ResultsTable::new(
        records.iter().map(|record| RowView::from_record(record)).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorded {
        singles: Vec<(String, PrintKind)>,
        batches: Vec<Vec<String>>,
        notices: Vec<Notice>,
    }

    impl ResultHandlers for Recorded {
        fn print_single(&mut self, entry: &str, kind: PrintKind) {
            self.singles.push((entry.to_string(), kind));
        }

        fn print_batch(&mut self, entries: Vec<String>) {
            self.batches.push(entries);
        }

        fn report(&mut self, notice: Notice) {
            self.notices.push(notice);
        }
    }

    fn record(entry: Option<&str>, status: &str, cause: Option<&str>) -> Record {
        Record {
            entry_number: entry.map(str::to_string),
            animal_status: Some(status.to_string()),
            possible_cause: cause.map(str::to_string),
            ..Record::default()
        }
    }

    fn table(records: &[Record]) -> ResultsTable {
        let refs: Vec<&Record> = records.iter().collect();
        match render(&refs) {
            ResultsPane::Table(table) => table,
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_renders_no_results() {
        assert_eq!(render(&[]), ResultsPane::NoResults);
        assert!(render(&[]).table().is_none());
    }

    #[test]
    fn rows_carry_placeholders_and_header_count() {
        let table = table(&[Record::default(), record(Some("3"), "Cadáver", None)]);

        assert_eq!(table.header(), "Records found: 2");
        let blank = &table.rows()[0];
        assert_eq!(blank.entry_label(), MISSING_ENTRY);
        assert_eq!(blank.date, MISSING_FIELD);
        assert_eq!(blank.species, MISSING_FIELD);
        assert_eq!(blank.vitality, Vitality::Deceased);
    }

    #[test]
    fn actions_follow_vitality_and_captive_birth() {
        let table = table(&[
            record(Some("1"), "Animal vivo", None),
            record(Some("2"), "Cadáver", None),
            record(Some("3"), "Animal vivo", Some("Nacido en el centro")),
        ]);

        assert_eq!(
            table.rows()[0].actions,
            RowActions::ClinicalAndPostMortem {
                emphasized: PrintKind::Clinical
            }
        );
        assert_eq!(
            table.rows()[1].actions,
            RowActions::ClinicalAndPostMortem {
                emphasized: PrintKind::PostMortem
            }
        );
        assert_eq!(table.rows()[2].actions, RowActions::CaptiveBirth);
        assert_eq!(table.rows()[2].actions.kinds(), vec![PrintKind::CaptiveBirth]);
        assert!(table.rows()[1].actions.is_emphasized(PrintKind::PostMortem));
    }

    #[test]
    fn select_all_toggles_without_rerender() {
        let mut table = table(&[
            record(Some("1"), "vivo", None),
            record(None, "vivo", None),
            record(Some("2"), "vivo", None),
        ]);
        let rows_before = table.rows().to_vec();

        table.toggle_all(true);
        assert!(table.all_checked());
        assert!(table.is_row_checked(0));
        assert!(!table.is_row_checked(1));
        assert_eq!(table.checked_entries(), vec!["1", "2"]);

        table.toggle_all(false);
        assert!(table.selection().is_empty());
        assert_eq!(table.rows(), rows_before.as_slice());
    }

    #[test]
    fn batch_print_reads_checkboxes_at_activation() {
        let mut table = table(&[
            record(Some("5"), "vivo", None),
            record(Some("3"), "Cadáver", None),
        ]);
        let mut handlers = Recorded::default();

        table.activate_batch_print(&mut handlers);
        assert_eq!(handlers.notices, vec![Notice::NothingSelected]);
        assert!(handlers.batches.is_empty());

        table.toggle_row(1);
        table.activate_batch_print(&mut handlers);
        table.toggle_row(0);
        table.activate_batch_print(&mut handlers);
        assert_eq!(
            handlers.batches,
            vec![vec!["3".to_string()], vec!["5".to_string(), "3".to_string()]]
        );
    }

    #[test]
    fn row_actions_dispatch_to_handlers() {
        let table = table(&[
            record(Some("5"), "Animal Vivo", None),
            record(Some("8"), "vivo", Some("nacido en el centro")),
            record(None, "vivo", None),
        ]);
        let mut handlers = Recorded::default();

        table.activate_row_action(0, RowPrintChoice::Primary, &mut handlers);
        table.activate_row_action(0, RowPrintChoice::Kind(PrintKind::PostMortem), &mut handlers);
        table.activate_row_action(1, RowPrintChoice::Kind(PrintKind::Clinical), &mut handlers);
        table.activate_row_action(1, RowPrintChoice::Primary, &mut handlers);
        table.activate_row_action(2, RowPrintChoice::Primary, &mut handlers);
        table.activate_row_action(9, RowPrintChoice::Primary, &mut handlers);

        assert_eq!(
            handlers.singles,
            vec![
                ("5".to_string(), PrintKind::Clinical),
                ("5".to_string(), PrintKind::PostMortem),
                ("8".to_string(), PrintKind::CaptiveBirth),
            ]
        );
        assert_eq!(handlers.notices.len(), 2);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut table = table(&[
            record(Some("1"), "vivo", None),
            record(Some("2"), "vivo", None),
            record(Some("3"), "vivo", None),
        ]);

        table.move_cursor_down(10);
        assert_eq!(table.cursor(), 2);
        table.move_cursor_up(1);
        assert_eq!(table.current_row().unwrap().entry_label(), "2");
        table.go_to_first();
        assert_eq!(table.cursor(), 0);
        table.go_to_last();
        assert_eq!(table.cursor(), 2);
    }
}
