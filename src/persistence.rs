use crate::db::KeyValueStore;
use crate::errors::{AppError, AppResult};
use crate::models::{
    random_base36, EvidenceFile, Feedback, FeedbackInput, Kpi, KpiStatus, Month, MonthlyKpiTarget,
    NewKpi, Trend,
};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const FEEDBACK_KEY_PREFIX: &str = "kobix-kpi-feedback-";
pub const CUSTOM_KPIS_KEY: &str = "custom-kpis";
const FEEDBACK_INDEX_PREFIX: &str = "kobix-kpi-feedback-index/";
const MONTHLY_TARGETS_PREFIX: &str = "monthly-targets-";
const PERFORMANCE_FILES_PREFIX: &str = "performance-files-";

/// Custom KPIs keyed by owning executive id.
pub type CustomKpis = BTreeMap<String, Vec<Kpi>>;

pub fn feedback_key(kpi_id: &str, month: Month) -> String {
    format!("{}{}-{}", FEEDBACK_KEY_PREFIX, kpi_id, month)
}

pub fn monthly_targets_key(month: Month) -> String {
    format!("{}{}", MONTHLY_TARGETS_PREFIX, month)
}

pub fn performance_files_key(month: Month) -> String {
    format!("{}{}", PERFORMANCE_FILES_PREFIX, month)
}

fn feedback_index_key(month: Month) -> String {
    format!("{}{}", FEEDBACK_INDEX_PREFIX, month)
}

/// Feedback, custom KPI, monthly target and uploaded-file records over a
/// [`KeyValueStore`].
///
/// Every collection is read whole, mutated in memory and written back whole.
/// There is a single writer per namespace; concurrent writers are
/// last-write-wins unless they go through [`Persistence::save_feedback_if_unchanged`].
///
/// Methods prefixed `try_` propagate storage errors. The unprefixed readers
/// log and degrade to absent or empty data.
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw)
    }

    // ─── Feedback ───────────────────────────────────────────────────────────

    /// Writes the (kpi, month) slot, replacing whatever was there.
    pub fn try_save_feedback(&self, kpi_id: &str, month: Month, input: FeedbackInput) -> AppResult<Feedback> {
        let input = input.normalized()?;
        let previous = self.try_get_feedback(kpi_id, month).unwrap_or(None);
        let feedback = build_feedback(kpi_id, month, input, previous.as_ref());
        self.write_json(&feedback_key(kpi_id, month), &feedback)?;
        if let Err(error) = self.index_feedback(kpi_id, month) {
            tracing::warn!(kpi_id = %kpi_id, month = %month, error = %error, "failed to update feedback index");
            // A stale index would hide the record; without one the next read rescans.
            if let Err(error) = self.store.remove(&feedback_index_key(month)) {
                tracing::warn!(month = %month, error = %error, "failed to drop stale feedback index");
            }
        }
        tracing::info!(kpi_id = %kpi_id, month = %month, feedback_id = %feedback.id, "feedback saved");
        Ok(feedback)
    }

    /// Validation errors are returned; storage failures are logged and yield `Ok(None)`.
    pub fn save_feedback(&self, kpi_id: &str, month: Month, input: FeedbackInput) -> AppResult<Option<Feedback>> {
        match self.try_save_feedback(kpi_id, month, input) {
            Ok(feedback) => Ok(Some(feedback)),
            Err(AppError::Validation(message)) => Err(AppError::Validation(message)),
            Err(error) => {
                tracing::error!(kpi_id = %kpi_id, month = %month, error = %error, "feedback save failed");
                Ok(None)
            }
        }
    }

    /// Saves only if the slot's current `updatedAt` equals `expected_updated_at`
    /// (`None` meaning the slot must be empty).
    pub fn save_feedback_if_unchanged(
        &self,
        kpi_id: &str,
        month: Month,
        input: FeedbackInput,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> AppResult<Feedback> {
        let current = self.try_get_feedback(kpi_id, month)?;
        let current_updated_at = current.as_ref().map(|feedback| feedback.updated_at);
        if current_updated_at != expected_updated_at {
            return Err(AppError::Conflict(format!(
                "feedback for {} in {} changed since it was read",
                kpi_id, month
            )));
        }
        self.try_save_feedback(kpi_id, month, input)
    }

    pub fn try_get_feedback(&self, kpi_id: &str, month: Month) -> AppResult<Option<Feedback>> {
        self.read_json(&feedback_key(kpi_id, month))
    }

    pub fn get_feedback(&self, kpi_id: &str, month: Month) -> Option<Feedback> {
        match self.try_get_feedback(kpi_id, month) {
            Ok(feedback) => feedback,
            Err(error) => {
                tracing::warn!(kpi_id = %kpi_id, month = %month, error = %error, "feedback read failed");
                None
            }
        }
    }

    /// Every feedback stored for `month`, keyed by KPI id.
    pub fn get_all_feedbacks(&self, month: Month) -> BTreeMap<String, Feedback> {
        let kpi_ids = match self.read_json::<BTreeSet<String>>(&feedback_index_key(month)) {
            Ok(Some(kpi_ids)) => kpi_ids,
            Ok(None) | Err(_) => match self.rebuild_feedback_index(month) {
                Ok(kpi_ids) => kpi_ids,
                Err(error) => {
                    tracing::warn!(month = %month, error = %error, "feedback index unavailable");
                    return BTreeMap::new();
                }
            },
        };

        let mut feedbacks = BTreeMap::new();
        for kpi_id in kpi_ids {
            match self.try_get_feedback(&kpi_id, month) {
                // The record's own month decides membership, not the key suffix.
                Ok(Some(feedback)) if feedback.month == month => {
                    feedbacks.insert(feedback.kpi_id.clone(), feedback);
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(kpi_id = %kpi_id, month = %month, error = %error, "skipping unreadable feedback");
                }
            }
        }
        feedbacks
    }

    /// Rebuilds the month index from a full key scan. Needed once for data
    /// written before the index existed. The index is only a cache: the
    /// scanned ids are returned even when saving them fails.
    pub fn rebuild_feedback_index(&self, month: Month) -> AppResult<BTreeSet<String>> {
        let suffix = format!("-{}", month);
        let mut kpi_ids = BTreeSet::new();
        for key in self.store.keys()? {
            if !key.starts_with(FEEDBACK_KEY_PREFIX)
                || key.starts_with(FEEDBACK_INDEX_PREFIX)
                || !key.ends_with(&suffix)
            {
                continue;
            }
            match self.read_json::<Feedback>(&key) {
                Ok(Some(feedback)) if feedback.month == month => {
                    kpi_ids.insert(feedback.kpi_id);
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(key = %key, error = %error, "ignoring unparsable feedback entry");
                }
            }
        }
        match self.write_json(&feedback_index_key(month), &kpi_ids) {
            Ok(()) => tracing::debug!(month = %month, entries = kpi_ids.len(), "rebuilt feedback index"),
            Err(error) => {
                tracing::warn!(month = %month, error = %error, "rebuilt feedback index could not be saved")
            }
        }
        Ok(kpi_ids)
    }

    fn index_feedback(&self, kpi_id: &str, month: Month) -> AppResult<()> {
        let key = feedback_index_key(month);
        let mut kpi_ids = match self.read_json::<BTreeSet<String>>(&key) {
            Ok(Some(kpi_ids)) => kpi_ids,
            Ok(None) | Err(_) => self.rebuild_feedback_index(month)?,
        };
        if kpi_ids.insert(kpi_id.to_string()) {
            self.write_json(&key, &kpi_ids)?;
        }
        Ok(())
    }

    /// The KPI stamped with `month` and that month's feedback, if any. Never
    /// fails; without storage the feedback is simply absent.
    pub fn update_kpi_with_feedback(&self, kpi: &Kpi, month: Month) -> Kpi {
        Kpi {
            month: Some(month),
            feedback: self.get_feedback(&kpi.id, month),
            ..kpi.clone()
        }
    }

    // ─── Custom KPIs ────────────────────────────────────────────────────────

    pub fn try_custom_kpis(&self) -> AppResult<CustomKpis> {
        Ok(self.read_json(CUSTOM_KPIS_KEY)?.unwrap_or_default())
    }

    pub fn custom_kpis(&self) -> CustomKpis {
        self.try_custom_kpis().unwrap_or_else(|error| {
            tracing::warn!(error = %error, "custom KPI read failed");
            CustomKpis::new()
        })
    }

    pub fn custom_kpis_for(&self, executive_id: &str) -> Vec<Kpi> {
        self.custom_kpis().remove(executive_id).unwrap_or_default()
    }

    pub fn add_custom_kpi(&self, executive_id: &str, new_kpi: NewKpi) -> AppResult<Kpi> {
        if executive_id.trim().is_empty() {
            return Err(AppError::Validation("Select an executive first".to_string()));
        }
        let name = new_kpi.name.trim();
        let category = new_kpi.category.trim();
        if name.is_empty() || category.is_empty() {
            return Err(AppError::Validation("KPI name and category are required".to_string()));
        }

        let kpi = Kpi {
            id: format!("custom-{}-{}", Utc::now().timestamp_millis(), random_base36(9)),
            name: name.to_string(),
            target: new_kpi.target,
            current: 0.0,
            unit: new_kpi.unit.trim().to_string(),
            trend: Trend::Stable,
            status: KpiStatus::OnTrack,
            category: category.to_string(),
            period: new_kpi.period,
            month: None,
            feedback: None,
        };

        let mut custom = self.try_custom_kpis()?;
        custom.entry(executive_id.to_string()).or_default().push(kpi.clone());
        self.write_json(CUSTOM_KPIS_KEY, &custom)?;
        tracing::info!(executive_id = %executive_id, kpi_id = %kpi.id, "custom KPI added");
        Ok(kpi)
    }

    /// Removes a custom KPI and its target override for `month`. Returns
    /// `false` when the KPI is not one of the executive's custom KPIs.
    pub fn delete_custom_kpi(&self, executive_id: &str, kpi_id: &str, month: Month) -> AppResult<bool> {
        let mut custom = self.try_custom_kpis()?;
        let Some(kpis) = custom.get_mut(executive_id) else {
            return Ok(false);
        };
        let before = kpis.len();
        kpis.retain(|kpi| kpi.id != kpi_id);
        if kpis.len() == before {
            return Ok(false);
        }
        self.write_json(CUSTOM_KPIS_KEY, &custom)?;
        self.remove_monthly_target(executive_id, kpi_id, month)?;
        tracing::info!(executive_id = %executive_id, kpi_id = %kpi_id, "custom KPI deleted");
        Ok(true)
    }

    // ─── Monthly targets ────────────────────────────────────────────────────

    pub fn try_monthly_targets(&self, month: Month) -> AppResult<Vec<MonthlyKpiTarget>> {
        Ok(self.read_json(&monthly_targets_key(month))?.unwrap_or_default())
    }

    pub fn monthly_targets(&self, month: Month) -> Vec<MonthlyKpiTarget> {
        self.try_monthly_targets(month).unwrap_or_else(|error| {
            tracing::warn!(month = %month, error = %error, "monthly target read failed");
            Vec::new()
        })
    }

    pub fn set_monthly_target(
        &self,
        executive_id: &str,
        kpi_id: &str,
        month: Month,
        target: f64,
    ) -> AppResult<MonthlyKpiTarget> {
        if !target.is_finite() {
            return Err(AppError::Validation("Target must be a finite number".to_string()));
        }
        let entry = MonthlyKpiTarget {
            kpi_id: kpi_id.to_string(),
            executive_id: executive_id.to_string(),
            month,
            target,
        };

        let mut targets = self.try_monthly_targets(month)?;
        targets.retain(|existing| {
            existing.month == month && !(existing.executive_id == executive_id && existing.kpi_id == kpi_id)
        });
        targets.push(entry.clone());
        self.write_json(&monthly_targets_key(month), &targets)?;
        Ok(entry)
    }

    pub fn remove_monthly_target(&self, executive_id: &str, kpi_id: &str, month: Month) -> AppResult<bool> {
        let mut targets = self.try_monthly_targets(month)?;
        let before = targets.len();
        targets.retain(|existing| !(existing.executive_id == executive_id && existing.kpi_id == kpi_id));
        if targets.len() == before {
            return Ok(false);
        }
        self.write_json(&monthly_targets_key(month), &targets)?;
        Ok(true)
    }

    pub fn effective_target(&self, executive_id: &str, kpi: &Kpi, month: Month) -> f64 {
        resolve_target(&self.monthly_targets(month), executive_id, kpi)
    }

    // ─── Uploaded performance files ─────────────────────────────────────────

    pub fn performance_files(&self, month: Month) -> Vec<EvidenceFile> {
        match self.read_json::<Vec<EvidenceFile>>(&performance_files_key(month)) {
            Ok(files) => files.unwrap_or_default(),
            Err(error) => {
                tracing::warn!(month = %month, error = %error, "performance file read failed");
                Vec::new()
            }
        }
    }

    pub fn append_performance_files(&self, month: Month, files: Vec<EvidenceFile>) -> AppResult<Vec<EvidenceFile>> {
        if files.is_empty() {
            return Err(AppError::Validation("Select at least one file to upload".to_string()));
        }
        let key = performance_files_key(month);
        let mut stored: Vec<EvidenceFile> = self.read_json(&key)?.unwrap_or_default();
        let added = files.len();
        stored.extend(files);
        self.write_json(&key, &stored)?;
        tracing::info!(month = %month, added, total = stored.len(), "performance files stored");
        Ok(stored)
    }

    pub fn delete_performance_file(&self, month: Month, file_id: &str) -> AppResult<bool> {
        let key = performance_files_key(month);
        let mut stored: Vec<EvidenceFile> = self.read_json(&key)?.unwrap_or_default();
        let before = stored.len();
        stored.retain(|file| file.id != file_id);
        if stored.len() == before {
            return Ok(false);
        }
        self.write_json(&key, &stored)?;
        Ok(true)
    }
}

/// Monthly override for the KPI if one is set and non-zero, else its static target.
pub fn resolve_target(targets: &[MonthlyKpiTarget], executive_id: &str, kpi: &Kpi) -> f64 {
    targets
        .iter()
        .find(|entry| entry.executive_id == executive_id && entry.kpi_id == kpi.id)
        .map(|entry| entry.target)
        .filter(|target| *target != 0.0)
        .unwrap_or(kpi.target)
}

fn build_feedback(kpi_id: &str, month: Month, input: FeedbackInput, previous: Option<&Feedback>) -> Feedback {
    let mut now = Utc::now();
    if let Some(previous) = previous {
        if now <= previous.updated_at {
            now = previous.updated_at + Duration::milliseconds(1);
        }
    }
    Feedback {
        id: format!("{}-{}-{}", kpi_id, month, now.timestamp_millis()),
        kpi_id: kpi_id.to_string(),
        month,
        root_cause: input.root_cause,
        action_plan: input.action_plan,
        evidence_files: input.evidence_files,
        created_at: now,
        updated_at: now,
    }
}
