// src/session.rs
//
// Per-document session: owns the presentation state, the preference snapshot
// and the pass lifecycle. Constructed when a document loads (gated by the
// site classifier), torn down on navigation or deactivation. One pass runs at
// a time; a mutation event arriving mid-pass should re-arm the debounce timer
// rather than start a second pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use serde_json::json;

use crate::annotations;
use crate::converter::{calculate_hours, format_hours};
use crate::dom::Document;
use crate::extractor::PriceExtractor;
use crate::messages::{Command, Response};
use crate::metrics;
use crate::presentation::{DisplayMode, PresentationController, PresentedPrice};
use crate::settings::Settings;
use crate::site::is_shopping_site;
use crate::storage::{self, keys, SettingsStore, UserPrefs};
use crate::tiers::{self, TierBasis, TierColor};

/// One converted price as reported to consumers.
#[derive(Debug, Clone, Serialize)]
pub struct PriceReport {
    pub price: f64,
    pub hours: Option<f64>,
    pub formatted: String,
    pub tier: TierColor,
    pub original_text: String,
}

/// Outcome of one full detect → convert → present pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassStats {
    pub candidates: usize,
    pub badges_injected: usize,
    pub badges_updated: usize,
    pub prices_replaced: usize,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl PassStats {
    fn empty() -> Self {
        Self {
            candidates: 0,
            badges_injected: 0,
            badges_updated: 0,
            prices_replaced: 0,
            duration_ms: 0,
            completed_at: Utc::now(),
        }
    }
}

pub struct DocumentSession {
    store: Arc<dyn SettingsStore>,
    prefs: ArcSwap<UserPrefs>,
    extractor: PriceExtractor,
    controller: PresentationController,
    active: bool,
    in_flight: AtomicBool,
    last_reports: Vec<PriceReport>,
}

impl DocumentSession {
    /// Gate on the page address: no session for non-shopping sites.
    pub fn attach(
        address: &str,
        settings: &Settings,
        store: Arc<dyn SettingsStore>,
    ) -> Option<Self> {
        if !is_shopping_site(address, &settings.site) {
            info!("'{}' is not a shopping site, staying dormant", address);
            return None;
        }
        Some(Self::new(settings, store))
    }

    /// Unconditional constructor for hosts that gate elsewhere.
    pub fn new(settings: &Settings, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            prefs: ArcSwap::from_pointee(UserPrefs::default()),
            extractor: PriceExtractor::new(settings),
            controller: PresentationController::new(&settings.presentation.badge_class),
            active: true,
            in_flight: AtomicBool::new(false),
            last_reports: Vec::new(),
        }
    }

    /// Preference snapshot from the last pass (or defaults before one ran).
    pub fn prefs(&self) -> Arc<UserPrefs> {
        self.prefs.load_full()
    }

    /// True while a pass is running. The debounce layer re-arms instead of
    /// triggering a concurrent pass when this is set.
    pub fn is_pass_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn current_prices(&self) -> &[PriceReport] {
        &self.last_reports
    }

    /// One full pass over the current document state.
    pub async fn process(&mut self, doc: &mut Document) -> PassStats {
        self.in_flight.store(true, Ordering::SeqCst);
        let stats = self.process_inner(doc).await;
        self.in_flight.store(false, Ordering::SeqCst);
        metrics::increment_pass_completed();
        stats
    }

    async fn process_inner(&mut self, doc: &mut Document) -> PassStats {
        let started = Instant::now();
        if !self.active {
            self.controller.reset(doc);
            return PassStats::empty();
        }

        // Suspension point: the document may have mutated by the time this
        // returns, which is fine — extraction below sees the current state.
        let prefs = storage::load_prefs(self.store.as_ref()).await;
        self.prefs.store(Arc::new(prefs.clone()));

        // A pending mode change reverts the old representation first so the
        // extractor sees original price text, not our own output.
        self.controller.prepare_mode(doc, prefs.display_mode);

        let candidates = self.extractor.extract(doc);
        let mut items = Vec::with_capacity(candidates.len());
        let mut reports = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let hours = calculate_hours(candidate.price, prefs.hourly_wage);
            let formatted = format_hours(hours);
            annotations::write_hours(doc, candidate.element, hours, &formatted);

            let tier_value = match prefs.tiers.basis {
                TierBasis::Money => candidate.price,
                TierBasis::Hours => hours.unwrap_or(f64::NAN),
            };
            reports.push(PriceReport {
                price: candidate.price,
                hours,
                formatted: formatted.clone(),
                tier: tiers::classify(tier_value, &prefs.tiers),
                original_text: candidate.original_text.clone(),
            });
            items.push(PresentedPrice {
                element: candidate.element,
                original_text: candidate.original_text.clone(),
                formatted_hours: formatted,
                hours,
            });
        }

        let outcome = self
            .controller
            .run(doc, &items, prefs.display_mode, prefs.show_hours);
        self.last_reports = reports;

        PassStats {
            candidates: candidates.len(),
            badges_injected: outcome.badges_injected,
            badges_updated: outcome.badges_updated,
            prices_replaced: outcome.prices_replaced,
            duration_ms: started.elapsed().as_millis() as u64,
            completed_at: Utc::now(),
        }
    }

    /// Return the document to a pristine state: presentation reverted, all
    /// metadata attributes stripped, in-memory results cleared.
    pub fn deactivate(&mut self, doc: &mut Document) {
        self.controller.reset(doc);
        annotations::strip_all(doc);
        self.last_reports.clear();
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Dispatch one control message. Invalid payloads produce an error
    /// response and change no state.
    pub async fn handle_command(&mut self, doc: &mut Document, command: Command) -> Response {
        match command {
            Command::GetCurrentPrices => Response::Prices {
                prices: self.last_reports.clone(),
            },
            Command::Reprocess => {
                let stats = self.process(doc).await;
                Response::Ack { stats: Some(stats) }
            }
            Command::SetActive { active } => {
                if active {
                    self.active = true;
                    let stats = self.process(doc).await;
                    Response::Ack { stats: Some(stats) }
                } else {
                    self.deactivate(doc);
                    Response::Ack { stats: None }
                }
            }
            Command::SetDisplayMode { mode } => {
                let parsed: DisplayMode = match mode.parse() {
                    Ok(parsed) => parsed,
                    Err(err) => return Response::Error { message: err },
                };
                if let Err(err) = self
                    .store
                    .set(keys::DISPLAY_MODE, json!(parsed.as_str()))
                    .await
                {
                    warn!("failed to persist display mode: {err}");
                    return Response::Error {
                        message: format!("failed to persist display mode: {err}"),
                    };
                }
                let stats = self.process(doc).await;
                Response::Ack { stats: Some(stats) }
            }
            Command::SetShowHours { show } => {
                if let Err(err) = self.store.set(keys::SHOW_HOURS, json!(show)).await {
                    warn!("failed to persist show-hours flag: {err}");
                    return Response::Error {
                        message: format!("failed to persist show-hours flag: {err}"),
                    };
                }
                let stats = self.process(doc).await;
                Response::Ack { stats: Some(stats) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn shop_doc() -> Document {
        Document::parse_html(
            r#"<html><body><span class="price" id="p">$50</span></body></html>"#,
        )
        .unwrap()
    }

    async fn session_with_wage(wage: f64) -> DocumentSession {
        let store = Arc::new(MemoryStore::new());
        store
            .set(keys::HOURLY_WAGE, json!(wage))
            .await
            .unwrap();
        DocumentSession::new(&Settings::default(), store)
    }

    #[tokio::test]
    async fn test_attach_gates_on_site() {
        let store: Arc<dyn SettingsStore> = Arc::new(MemoryStore::new());
        let settings = Settings::default();
        assert!(DocumentSession::attach(
            "https://www.amazon.com/dp/X",
            &settings,
            Arc::clone(&store)
        )
        .is_some());
        assert!(
            DocumentSession::attach("https://news.example.com/a", &settings, store).is_none()
        );
    }

    #[tokio::test]
    async fn test_pass_produces_reports_and_flags() {
        let mut doc = shop_doc();
        let mut session = session_with_wage(25.0).await;

        let stats = session.process(&mut doc).await;
        assert_eq!(stats.candidates, 1);
        assert_eq!(stats.badges_injected, 1);
        assert!(!session.is_pass_in_flight());

        let reports = session.current_prices();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].price, 50.0);
        assert_eq!(reports[0].hours, Some(2.0));
        assert_eq!(reports[0].formatted, "2h");
    }

    #[tokio::test]
    async fn test_unset_wage_formats_na() {
        let mut doc = shop_doc();
        let mut session = session_with_wage(0.0).await;
        session.process(&mut doc).await;
        let reports = session.current_prices();
        assert_eq!(reports[0].hours, None);
        assert_eq!(reports[0].formatted, "N/A");
    }

    #[tokio::test]
    async fn test_deactivate_restores_pristine_document() {
        let mut doc = shop_doc();
        let pristine = doc.to_html();
        let mut session = session_with_wage(25.0).await;

        session.process(&mut doc).await;
        assert_ne!(doc.to_html(), pristine);

        session.deactivate(&mut doc);
        assert_eq!(doc.to_html(), pristine);
        assert!(session.current_prices().is_empty());
        assert!(!session.is_active());
    }
}
