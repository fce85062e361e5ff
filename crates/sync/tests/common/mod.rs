//! Shared mock infrastructure for the engine tests: an in-memory catalog
//! source and a recording submission sink.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use camino::Utf8PathBuf;
use chrono::{TimeZone, Utc};
use orkl_primitives::{CatalogEntry, EntryId, LibraryEntry, Page, WorkId};
use orkl_store::CheckpointStore;
use orkl_stix::Bundle;
use orkl_sync::{BundleSink, CatalogSource, SinkError, SourceError};
use tempdir::TempDir;

/// In-memory catalog: a fixed sequence of newest-first pages plus a report
/// per child id mentioned in them.
#[derive(Clone, Debug, Default)]
pub struct MockCatalog {
    pages: Vec<Vec<CatalogEntry>>,
    reports: HashMap<String, LibraryEntry>,
    latest: EntryId,
    fail_page_at_offset: Option<u32>,
    page_fetches: Arc<Mutex<u32>>,
}

impl MockCatalog {
    /// Every child id mentioned by a page gets a default report, so most
    /// tests don't have to wire reports by hand.
    pub fn new(pages: Vec<Vec<CatalogEntry>>) -> Self {
        let mut reports = HashMap::new();

        for page in &pages {
            for entry in page {
                for child in &entry.child_record_ids {
                    let _ = reports.insert(child.clone(), report(child));
                }
            }
        }

        let latest = pages
            .iter()
            .flatten()
            .map(|entry| entry.id)
            .max()
            .unwrap_or(EntryId::ZERO);

        Self {
            pages,
            reports,
            latest,
            fail_page_at_offset: None,
            page_fetches: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_latest(mut self, latest: u64) -> Self {
        self.latest = EntryId::new(latest);
        self
    }

    pub fn with_report(mut self, report: LibraryEntry) -> Self {
        let _ = self.reports.insert(report.id.clone(), report);
        self
    }

    pub fn without_report(mut self, id: &str) -> Self {
        let _ = self.reports.remove(id);
        self
    }

    pub fn fail_page_at(mut self, offset: u32) -> Self {
        self.fail_page_at_offset = Some(offset);
        self
    }

    pub fn page_fetches(&self) -> u32 {
        *self.page_fetches.lock().unwrap()
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn latest_version(&self) -> Result<EntryId, SourceError> {
        Ok(self.latest)
    }

    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<Option<Page>, SourceError> {
        *self.page_fetches.lock().unwrap() += 1;

        if self.fail_page_at_offset == Some(offset) {
            return Err(SourceError::new(format!(
                "injected page failure at offset {offset}"
            )));
        }

        let index = (offset / limit.max(1)) as usize;

        match self.pages.get(index) {
            Some(entries) if !entries.is_empty() => {
                Ok(Some(Page::new(entries.clone(), limit, offset)))
            }
            _ => Ok(None),
        }
    }

    async fn fetch_report(&self, id: &str) -> Result<LibraryEntry, SourceError> {
        self.reports
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::new(format!("no report {id}")))
    }
}

#[derive(Clone, Debug)]
pub struct Submission {
    pub work_id: WorkId,
    pub objects: usize,
    pub update: bool,
}

/// Recording sink. Clones share state, so tests keep a handle while the
/// driver owns another.
#[derive(Clone, Debug, Default)]
pub struct MockSink {
    works: Arc<Mutex<Vec<String>>>,
    submissions: Arc<Mutex<Vec<Submission>>>,
    completions: Arc<Mutex<Vec<(WorkId, String)>>>,
    fail_submissions: bool,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_submissions() -> Self {
        Self {
            fail_submissions: true,
            ..Self::default()
        }
    }

    pub fn works(&self) -> Vec<String> {
        self.works.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn completions(&self) -> Vec<(WorkId, String)> {
        self.completions.lock().unwrap().clone()
    }
}

#[async_trait]
impl BundleSink for MockSink {
    async fn begin_work(&self, name: &str) -> Result<WorkId, SinkError> {
        let mut works = self.works.lock().unwrap();
        works.push(name.to_owned());

        Ok(WorkId::new(format!("work-{}", works.len())))
    }

    async fn submit(
        &self,
        bundle: &Bundle,
        work_id: &WorkId,
        update: bool,
    ) -> Result<(), SinkError> {
        if self.fail_submissions {
            return Err(SinkError::new("injected submission failure"));
        }

        self.submissions.lock().unwrap().push(Submission {
            work_id: work_id.clone(),
            objects: bundle.len(),
            update,
        });

        Ok(())
    }

    async fn complete_work(&self, work_id: &WorkId, message: &str) -> Result<(), SinkError> {
        self.completions
            .lock()
            .unwrap()
            .push((work_id.clone(), message.to_owned()));

        Ok(())
    }
}

pub fn entry(id: u64, year: i32, children: &[&str]) -> CatalogEntry {
    let created_at = Utc.with_ymd_and_hms(year, 6, 1, 12, 0, 0).unwrap();

    CatalogEntry::new(
        EntryId::new(id),
        created_at,
        children.iter().map(|child| (*child).to_owned()).collect(),
    )
}

pub fn report(id: &str) -> LibraryEntry {
    LibraryEntry {
        id: id.to_owned(),
        plain_text: Some(format!("report {id}")),
        report_names: vec![format!("{id}.pdf")],
        ..LibraryEntry::default()
    }
}

pub fn store_in(dir: &TempDir) -> CheckpointStore {
    let path = Utf8PathBuf::from_path_buf(dir.path().join("checkpoint.json")).unwrap();

    CheckpointStore::new(path)
}
