pub mod parse;
pub mod prompt;
pub mod retry;

use tracing::{info, warn};

use crate::model::{LanguageModel, ModelError};
use crate::record::{CompanyFacts, ExtractionRecord};
use parse::MalformedOutput;
use retry::{Backoff, Sleeper};

/// Outcome of a single model call.
#[derive(Debug)]
pub enum Attempt {
    Success(CompanyFacts),
    Transient(String),
    Terminal(String),
}

impl Attempt {
    fn from_reply(reply: Result<String, ModelError>) -> Attempt {
        match reply {
            Ok(raw) => match parse::parse_response(&raw) {
                Ok(facts) => Attempt::Success(facts),
                Err(e) => Attempt::Transient(malformed_reason(&e)),
            },
            Err(e) if e.is_retryable() => Attempt::Transient(e.to_string()),
            Err(e) => Attempt::Terminal(e.to_string()),
        }
    }
}

fn malformed_reason(e: &MalformedOutput) -> String {
    format!("malformed output: {}", e)
}

/// Distill aggregated text into the six facts. Never fails: falls back to sentinel records.
pub async fn extract(
    model: &dyn LanguageModel,
    sleeper: &dyn Sleeper,
    backoff: Backoff,
    site: &str,
    text: &str,
) -> ExtractionRecord {
    if text.is_empty() {
        info!("No content for {}, skipping model call", site);
        return ExtractionRecord::new(site, CompanyFacts::no_content());
    }

    let prompt = prompt::build_prompt(site, text);
    let mut attempts = 0u32;

    while backoff.can_retry(attempts) {
        let reply = model.complete(&prompt).await;
        let rate_limited = matches!(&reply, Err(e) if e.is_rate_limit());
        attempts += 1;

        let reason = match Attempt::from_reply(reply) {
            Attempt::Success(facts) => {
                info!("Extracted facts for {} (attempt {})", site, attempts);
                return ExtractionRecord::new(site, facts);
            }
            Attempt::Terminal(reason) => {
                warn!("Model error for {}, not retrying: {}", site, reason);
                return ExtractionRecord::new(site, CompanyFacts::failed());
            }
            Attempt::Transient(reason) => reason,
        };

        if !backoff.can_retry(attempts) {
            warn!(
                "Giving up on {} after {} attempts: {}",
                site, attempts, reason
            );
            break;
        }

        let wait = backoff.delay(attempts - 1);
        if rate_limited {
            warn!(
                "Model rate limit hit for {} (attempt {}/{}). Retrying in {:.1}s",
                site,
                attempts,
                backoff.max_attempts,
                wait.as_secs_f64()
            );
        } else {
            warn!(
                "Attempt {}/{} for {} failed ({}). Retrying in {:.1}s",
                attempts,
                backoff.max_attempts,
                site,
                reason,
                wait.as_secs_f64()
            );
        }
        sleeper.sleep(wait).await;
    }

    ExtractionRecord::new(site, CompanyFacts::failed())
}
