use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::aggregate;
use crate::extractor::{self, retry::Backoff, retry::Sleeper};
use crate::fetch::Fetcher;
use crate::links;
use crate::model::LanguageModel;
use crate::record::{CompanyFacts, ExtractionRecord};
use crate::settings::{EmptySitePolicy, Settings};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sites: usize,
    pub records: usize,
    pub skipped: usize,
}

/// Discover → aggregate → extract, one site at a time.
pub struct Pipeline<'a> {
    settings: &'a Settings,
    fetcher: &'a dyn Fetcher,
    model: &'a dyn LanguageModel,
    sleeper: &'a dyn Sleeper,
    progress: ProgressBar,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: &'a Settings,
        fetcher: &'a dyn Fetcher,
        model: &'a dyn LanguageModel,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Pipeline {
            settings,
            fetcher,
            model,
            sleeper,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    fn backoff(&self) -> Backoff {
        Backoff::new(self.settings.max_retries, self.settings.backoff_base())
    }

    /// Process one site. `None` means the site is left out of the output.
    pub async fn process_site(&self, site: &str) -> Option<ExtractionRecord> {
        let found = links::discover(self.fetcher, site).await;
        if found.is_empty() {
            info!("No relevant links found for {}", site);
            return match self.settings.empty_site_policy {
                EmptySitePolicy::Skip => None,
                EmptySitePolicy::Record => {
                    Some(ExtractionRecord::new(site, CompanyFacts::no_content()))
                }
            };
        }

        let text = aggregate::aggregate(self.fetcher, &found).await;
        if text.is_empty() {
            warn!("None of the {} relevant pages for {} yielded text", found.len(), site);
        }
        let record =
            extractor::extract(self.model, self.sleeper, self.backoff(), site, &text.text).await;
        Some(record)
    }

    /// Records in site order. Sleeps the pacing delay between consecutive sites.
    pub async fn run(&self, sites: &[String]) -> (Vec<ExtractionRecord>, RunSummary) {
        let mut records = Vec::with_capacity(sites.len());
        let mut summary = RunSummary {
            sites: sites.len(),
            ..Default::default()
        };

        self.progress.set_length(sites.len() as u64);
        for (i, site) in sites.iter().enumerate() {
            self.progress.set_message(site.clone());
            info!("Processing: {}", site);

            match self.process_site(site).await {
                Some(record) => records.push(record),
                None => summary.skipped += 1,
            }
            self.progress.inc(1);

            if i + 1 < sites.len() {
                self.sleeper.sleep(self.settings.site_delay()).await;
            }
        }
        self.progress.finish_and_clear();

        summary.records = records.len();
        (records, summary)
    }
}
