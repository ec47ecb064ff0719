// Creation of the Input and Results documents of every team member.

use std::thread;
use std::time::Duration;

use crate::feedback::*;

/// A team member and their two documents.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PersonRecord {
    pub name: String,
    pub input_id: String,
    pub results_id: String,
}

/// The two kinds of documents created for each member.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DocumentKind {
    Input,
    Results,
}

impl DocumentKind {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Input => "Input",
            DocumentKind::Results => "Results",
        }
    }
}

/// Creates the documents of every member, in roster order, and writes their URLs
/// back to the roster of the master document.
pub fn create_feedback_sheets<S: SpreadsheetStore + ?Sized>(
    store: &mut S,
    setup: &FeedbackSetup,
) -> FbResult<Vec<PersonRecord>> {
    let mut records: Vec<PersonRecord> = Vec::new();
    for name in setup.members.iter() {
        let input_id = create_member_document(store, setup, name, DocumentKind::Input)?;
        let results_id = create_member_document(store, setup, name, DocumentKind::Results)?;
        records.push(PersonRecord {
            name: name.clone(),
            input_id,
            results_id,
        });
    }

    let urls: Vec<Vec<CellValue>> = records
        .iter()
        .map(|r| {
            vec![
                CellValue::Text(setup.document_url(&r.input_id)),
                CellValue::Text(setup.document_url(&r.results_id)),
            ]
        })
        .collect();
    update_rows(
        store,
        &setup.master_id,
        &setup.config.roster.url_range(),
        &urls,
    )?;
    info!("recorded {} members in the roster", records.len());
    Ok(records)
}

fn create_member_document<S: SpreadsheetStore + ?Sized>(
    store: &mut S,
    setup: &FeedbackSetup,
    name: &str,
    kind: DocumentKind,
) -> FbResult<String> {
    let title = setup.title_pattern.title(name, kind.label());
    info!("creating spreadsheet {:?}...", title);
    let document_id = create_spreadsheet(store, setup, &title)?;

    match kind {
        DocumentKind::Input => {
            for colleague in setup.members.iter() {
                let sheet_title = if colleague == name {
                    SELF_SHEET
                } else {
                    colleague.as_str()
                };
                copy_sheet(
                    store,
                    &setup.master_id,
                    setup.input.sheet_id,
                    &document_id,
                    sheet_title,
                )?;
            }
        }
        DocumentKind::Results => {
            copy_sheet(
                store,
                &setup.master_id,
                setup.results.sheet_id,
                &document_id,
                RESULTS_SHEET,
            )?;
        }
    }
    // The copies were added after the placeholder sheet of the new document.
    store.delete_sheet(&document_id, 0).context(StoreSnafu {})?;
    Ok(document_id)
}

/// Creates a document and gives write access to the master users once it is ready.
fn create_spreadsheet<S: SpreadsheetStore + ?Sized>(
    store: &mut S,
    setup: &FeedbackSetup,
    title: &str,
) -> FbResult<String> {
    let document_id = store.create_document(title).context(StoreSnafu {})?;
    wait_until_ready(&*store, &document_id, setup.config.readiness)?;
    for user in setup.config.master_users.iter() {
        debug!("create_spreadsheet: granting {} to {}", WRITER_ROLE, user);
        store
            .grant_access(&document_id, user, WRITER_ROLE)
            .context(StoreSnafu {})?;
    }
    Ok(document_id)
}

fn copy_sheet<S: SpreadsheetStore + ?Sized>(
    store: &mut S,
    document_id: &str,
    sheet_id: u32,
    dest_document_id: &str,
    dest_sheet_title: &str,
) -> FbResult<()> {
    let new_sheet_id = store
        .copy_sheet(document_id, sheet_id, dest_document_id)
        .context(StoreSnafu {})?;
    store
        .rename_sheet(dest_document_id, new_sheet_id, dest_sheet_title)
        .context(StoreSnafu {})
}

/// Blocks until the store reports the document as ready, following the policy.
pub fn wait_until_ready<S: SpreadsheetStore + ?Sized>(
    store: &S,
    document_id: &str,
    policy: ReadinessPolicy,
) -> FbResult<()> {
    match policy {
        ReadinessPolicy::Immediate => Ok(()),
        ReadinessPolicy::Fixed { delay_ms } => {
            debug!("wait_until_ready: {} sleeping {}ms", document_id, delay_ms);
            thread::sleep(Duration::from_millis(delay_ms));
            Ok(())
        }
        ReadinessPolicy::Backoff {
            initial_delay_ms,
            factor,
            max_attempts,
        } => {
            let mut delay_ms = initial_delay_ms;
            for attempt in 1..=max_attempts {
                if store.document_ready(document_id).context(StoreSnafu {})? {
                    debug!("wait_until_ready: {} ready at attempt {}", document_id, attempt);
                    return Ok(());
                }
                if attempt < max_attempts {
                    thread::sleep(Duration::from_millis(delay_ms));
                    delay_ms = delay_ms.saturating_mul(factor.max(1) as u64);
                }
            }
            DocumentNotReadySnafu {
                document_id,
                attempts: max_attempts,
            }
            .fail()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::local_store::LocalStore;
    use crate::feedback::testing::*;
    use std::cell::Cell;

    // Reports documents as ready only after a number of polls.
    struct SlowStore {
        inner: LocalStore,
        polls_before_ready: u32,
        polls: Cell<u32>,
    }

    impl SpreadsheetStore for SlowStore {
        fn get_title(&self, document_id: &str) -> StoreResult<String> {
            self.inner.get_title(document_id)
        }
        fn list_sheets(&self, document_id: &str) -> StoreResult<Vec<SheetInfo>> {
            self.inner.list_sheets(document_id)
        }
        fn get_range(&self, document_id: &str, range: &str) -> StoreResult<Vec<Vec<CellValue>>> {
            self.inner.get_range(document_id, range)
        }
        fn update_range(
            &mut self,
            document_id: &str,
            range: &str,
            rows: &[Vec<CellValue>],
        ) -> StoreResult<()> {
            self.inner.update_range(document_id, range, rows)
        }
        fn create_document(&mut self, title: &str) -> StoreResult<String> {
            self.inner.create_document(title)
        }
        fn copy_sheet(&mut self, document_id: &str, sheet_id: u32, dest: &str) -> StoreResult<u32> {
            self.inner.copy_sheet(document_id, sheet_id, dest)
        }
        fn rename_sheet(&mut self, document_id: &str, sheet_id: u32, title: &str) -> StoreResult<()> {
            self.inner.rename_sheet(document_id, sheet_id, title)
        }
        fn delete_sheet(&mut self, document_id: &str, sheet_id: u32) -> StoreResult<()> {
            self.inner.delete_sheet(document_id, sheet_id)
        }
        fn grant_access(&mut self, document_id: &str, principal: &str, role: &str) -> StoreResult<()> {
            self.inner.grant_access(document_id, principal, role)
        }
        fn document_ready(&self, _document_id: &str) -> StoreResult<bool> {
            let polls = self.polls.get() + 1;
            self.polls.set(polls);
            Ok(polls > self.polls_before_ready)
        }
    }

    fn provision(members: &[&str]) -> (LocalStore, FeedbackSetup, Vec<PersonRecord>) {
        let (mut store, master_id) = master_store(members);
        let setup = FeedbackSetup::load(&store, &master_id, &test_config()).unwrap();
        let records = create_feedback_sheets(&mut store, &setup).unwrap();
        (store, setup, records)
    }

    #[test]
    fn two_documents_per_member() {
        let (store, setup, records) = provision(&["Alice", "Bob", "Carol"]);
        // The master plus two documents per member.
        assert_eq!(store.document_count(), 1 + 2 * 3);
        assert_eq!(records.len(), 3);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);

        let roster = store
            .get_range(&setup.master_id, &setup.config.roster.url_range())
            .unwrap();
        assert_eq!(roster.len(), 3);
        for (row, r) in roster.iter().zip(records.iter()) {
            assert_eq!(row[0], CellValue::Text(setup.document_url(&r.input_id)));
            assert_eq!(row[1], CellValue::Text(setup.document_url(&r.results_id)));
        }
    }

    #[test]
    fn input_document_has_one_sheet_per_colleague() {
        let (store, _, records) = provision(&["Alice", "Bob", "Carol"]);
        let bob = &records[1];
        let doc = store.document(&bob.input_id).unwrap();
        assert_eq!(doc.title, "Feedback Bob - Input 2024");
        let titles: Vec<&str> = doc.sheets.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Alice", SELF_SHEET, "Carol"]);
        assert!(doc.sheets.iter().all(|s| s.sheet_id != 0));
        // The copies carry the template content.
        assert_eq!(
            store.get_range(&bob.input_id, "Carol!A2:A3").unwrap(),
            vec![
                vec![CellValue::Text("Communication".to_string())],
                vec![CellValue::Text("Delivery".to_string())]
            ]
        );
        let principals: Vec<&str> = doc.permissions.iter().map(|p| p.principal.as_str()).collect();
        assert_eq!(principals, vec!["lead@example.com", "hr@example.com"]);
        assert!(doc.permissions.iter().all(|p| p.role == WRITER_ROLE));
    }

    #[test]
    fn results_document_has_a_results_sheet() {
        let (store, _, records) = provision(&["Alice", "Bob"]);
        let doc = store.document(&records[0].results_id).unwrap();
        assert_eq!(doc.title, "Feedback Alice - Results 2024");
        let titles: Vec<&str> = doc.sheets.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec![RESULTS_SHEET]);
        assert_eq!(doc.permissions.len(), 2);
    }

    #[test]
    fn single_member_rates_only_themself() {
        let (store, _, records) = provision(&["Alice"]);
        assert_eq!(store.document_count(), 3);
        let doc = store.document(&records[0].input_id).unwrap();
        assert_eq!(doc.sheets.len(), 1);
        assert_eq!(doc.sheets[0].title, SELF_SHEET);
    }

    #[test]
    fn backoff_polls_until_ready() {
        let mut inner = LocalStore::new();
        let id = inner.create_document("New").unwrap();
        let store = SlowStore {
            inner,
            polls_before_ready: 2,
            polls: Cell::new(0),
        };
        let policy = ReadinessPolicy::Backoff {
            initial_delay_ms: 0,
            factor: 2,
            max_attempts: 5,
        };
        wait_until_ready(&store, &id, policy).unwrap();
        assert_eq!(store.polls.get(), 3);
    }

    #[test]
    fn backoff_gives_up() {
        let mut inner = LocalStore::new();
        let id = inner.create_document("New").unwrap();
        let store = SlowStore {
            inner,
            polls_before_ready: 10,
            polls: Cell::new(0),
        };
        let policy = ReadinessPolicy::Backoff {
            initial_delay_ms: 0,
            factor: 2,
            max_attempts: 4,
        };
        let res = wait_until_ready(&store, &id, policy);
        assert!(matches!(
            res,
            Err(FeedbackError::DocumentNotReady { attempts: 4, .. })
        ));
        assert_eq!(store.polls.get(), 4);
    }

    #[test]
    fn provisioning_through_a_slow_store() {
        let (inner, master_id) = master_store(&["Alice", "Bob"]);
        let mut config = test_config();
        config.readiness = ReadinessPolicy::Backoff {
            initial_delay_ms: 0,
            factor: 1,
            max_attempts: 3,
        };
        let mut store = SlowStore {
            inner,
            polls_before_ready: 1,
            polls: Cell::new(0),
        };
        let setup = FeedbackSetup::load(&store, &master_id, &config).unwrap();
        let records = create_feedback_sheets(&mut store, &setup).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(store.inner.document_count(), 5);
    }
}
