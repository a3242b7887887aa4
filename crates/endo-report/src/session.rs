//! Report session.
//!
//! A [`Session`] owns the compiled schema, the report being edited, the
//! active disease pointer and the selected main location. Every mutation
//! goes through a method that leaves the report consistent before it
//! returns:
//!
//! - the active pointer names a disease present in the report, or is `None`
//! - removed diseases take their location entry with them once it is empty
//! - input groups without any value are removed from `inputs`
//! - single-select scopes hold at most one attribute
//!
//! Operations addressed at entries that do not exist are no-ops and log at
//! debug level.

use serde::Deserialize;

use endo_model::report::ScopeEntryMut;
use endo_model::{
    ActivePointer, AttributePattern, Disease, DiseaseEntry, FindingSchema, InputEntry, InputGroup,
    ProcedureType, ProspectiveMeta, Report, ReportDocument, RetroMeta, SessionMeta,
    SublocationLayout, document::normalize_report,
};

use crate::conditional::EvalContext;
use crate::defaults::apply_defaults;
use crate::sublocation;

/// A full report replacement delivered by an external backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LiveUpdate {
    #[serde(default)]
    pub report: Report,
    /// Replaces the overall remarks when present.
    #[serde(rename = "overallRemarks", default)]
    pub overall_remarks: Option<String>,
}

impl LiveUpdate {
    /// Parses an update payload.
    pub fn from_json_str(text: &str) -> endo_model::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// What a live update changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveUpdateOutcome {
    /// Entries rejected because the disease is not in the schema.
    pub dropped: Vec<ActivePointer>,
    /// Entries that were not in the report before the update.
    pub added: Vec<ActivePointer>,
}

/// One editing session over a compiled schema.
#[derive(Debug, Clone)]
pub struct Session {
    schema: FindingSchema,
    report: Report,
    active: Option<ActivePointer>,
    main_location: String,
    overall_remarks: String,
    retro_meta: Option<RetroMeta>,
    prosp_meta: Option<ProspectiveMeta>,
}

impl Session {
    /// Starts an empty session at the procedure's first location.
    pub fn new(schema: FindingSchema) -> Self {
        let main_location = schema.procedure.first_location().to_string();
        Self {
            schema,
            report: Report::new(),
            active: None,
            main_location,
            overall_remarks: String::new(),
            retro_meta: None,
            prosp_meta: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn schema(&self) -> &FindingSchema {
        &self.schema
    }

    pub fn procedure(&self) -> ProcedureType {
        self.schema.procedure
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn active(&self) -> Option<&ActivePointer> {
        self.active.as_ref()
    }

    pub fn main_location(&self) -> &str {
        &self.main_location
    }

    pub fn overall_remarks(&self) -> &str {
        &self.overall_remarks
    }

    /// The active disease's schema definition and report entry.
    pub fn active_disease(&self) -> Option<(&Disease, &DiseaseEntry)> {
        let active = self.active.as_ref()?;
        let disease = self.schema.disease(&active.disease)?;
        let entry = self.report.disease(&active.loc, &active.disease)?;
        Some((disease, entry))
    }

    /// Evaluation context over the current state.
    pub fn eval_context(&self) -> EvalContext<'_> {
        EvalContext::new(&self.report, self.active.as_ref(), &self.main_location)
    }

    /// Returns true if no disease has been added.
    pub fn is_report_empty(&self) -> bool {
        self.report.is_empty()
    }

    // ========================================================================
    // Diseases
    // ========================================================================

    /// Selects the main location. Unknown locations are ignored.
    pub fn select_main_location(&mut self, location: &str) -> bool {
        if !self.procedure().has_location(location) {
            tracing::debug!(location, "ignoring unknown main location");
            return false;
        }
        self.main_location = location.to_string();
        true
    }

    /// Adds `disease` at `location` if it is not there yet, then makes it
    /// active.
    ///
    /// A new entry starts with the disease's default sub-location and
    /// default attributes. Returns false if the schema does not offer the
    /// disease at that location.
    pub fn add_or_open_disease(&mut self, location: &str, disease: &str) -> bool {
        let Some(def) = self.schema.disease(disease) else {
            tracing::debug!(disease, "ignoring unknown disease");
            return false;
        };
        if !def.applies_to(location) {
            tracing::debug!(disease, location, "disease is not offered at this location");
            return false;
        }

        if self.report.disease(location, disease).is_none() {
            let mut entry = DiseaseEntry::default();
            if let Some(default) = def.default_sublocation.as_deref() {
                entry.sublocations.push(default.to_string());
                sublocation::add_implied_regions(&mut entry.sublocations);
            }
            apply_defaults(def, &mut entry);
            self.report
                .locations
                .entry(location.to_string())
                .or_default()
                .diseases
                .insert(disease.to_string(), entry);
            tracing::info!(location, disease, "added disease");
        }

        self.open_disease(location, disease)
    }

    /// Makes an existing entry active and moves the main location to it.
    pub fn open_disease(&mut self, location: &str, disease: &str) -> bool {
        if self.report.disease(location, disease).is_none() {
            tracing::debug!(location, disease, "cannot open a disease that is not in the report");
            return false;
        }
        self.active = Some(ActivePointer::new(location, disease));
        self.main_location = location.to_string();
        true
    }

    /// Removes a disease entry. Clears the active pointer if it pointed at
    /// the removed entry.
    pub fn remove_disease(&mut self, location: &str, disease: &str) -> bool {
        if self.report.remove_disease(location, disease).is_none() {
            tracing::debug!(location, disease, "nothing to remove");
            return false;
        }
        if self
            .active
            .as_ref()
            .is_some_and(|a| a.loc == location && a.disease == disease)
        {
            self.active = None;
        }
        tracing::info!(location, disease, "removed disease");
        true
    }

    // ========================================================================
    // Attributes and inputs
    // ========================================================================

    /// Toggles an attribute label in a section or subsection of the active
    /// disease.
    ///
    /// Single-select scopes clear their other labels when a new one is
    /// selected. Returns whether the label is now selected, or `None` when
    /// there is no active disease or the scope is not in the schema.
    pub fn toggle_attr(
        &mut self,
        section: &str,
        subsection: Option<&str>,
        label: &str,
    ) -> Option<bool> {
        let Some((disease, entry)) = self.active_parts() else {
            tracing::debug!(section, label, "no active disease to toggle on");
            return None;
        };
        let Some(scope) = disease.scope(section, subsection) else {
            tracing::debug!(section, subsection, "scope is not in the schema");
            return None;
        };
        let multi = scope.multi;
        let target = entry
            .sections
            .entry(section.to_string())
            .or_default()
            .scope_mut(subsection);

        if target.attrs.contains(label) {
            target.attrs.remove(label);
            return Some(false);
        }
        if !multi {
            target.attrs.clear();
        }
        target.attrs.insert(label);
        Some(true)
    }

    /// Sets the value of one input box of an input-pattern attribute.
    ///
    /// `raw_key` is the pattern source text and `ordinal` counts input boxes
    /// only. The value is trimmed. The group is created on the first
    /// non-empty value and removed once all its values are empty. Returns
    /// false when the pattern or the box does not exist.
    pub fn set_input_value(
        &mut self,
        section: &str,
        subsection: Option<&str>,
        raw_key: &str,
        ordinal: usize,
        value: &str,
    ) -> bool {
        let Some((disease, entry)) = self.active_parts() else {
            tracing::debug!(section, raw_key, "no active disease for input");
            return false;
        };
        let Some(pattern) = disease
            .scope(section, subsection)
            .and_then(|scope| scope.pattern(raw_key))
        else {
            tracing::debug!(section, subsection, raw_key, "input pattern is not in the schema");
            return false;
        };
        let Some(kind) = pattern
            .box_position(ordinal)
            .and_then(|pos| pattern.tokens[pos].box_kind())
        else {
            tracing::debug!(raw_key, ordinal, "input pattern has no such box");
            return false;
        };
        let value = value.trim();
        if !kind.accepts(value) {
            tracing::debug!(raw_key, ordinal, value, "value rejected by input box");
            return false;
        }

        let ScopeEntryMut { inputs, .. } = entry
            .sections
            .entry(section.to_string())
            .or_default()
            .scope_mut(subsection);

        let existing = inputs.iter().position(|input| {
            input
                .as_group()
                .is_some_and(|group| group.raw_key == raw_key)
        });
        match existing {
            Some(pos) => {
                let emptied = match &mut inputs[pos] {
                    InputEntry::Group(group) => {
                        group.realign(pattern.tokens.clone());
                        group.set_box_value(ordinal, value);
                        !group.has_any_value()
                    }
                    InputEntry::Plain(_) => false,
                };
                if emptied {
                    inputs.remove(pos);
                }
            }
            None if value.is_empty() => {}
            None => {
                let mut group = InputGroup::new(raw_key, pattern.tokens.clone());
                group.set_box_value(ordinal, value);
                inputs.push(InputEntry::Group(group));
            }
        }
        true
    }

    // ========================================================================
    // Entry details
    // ========================================================================

    /// Toggles a plain sub-location on the active disease. Returns whether
    /// it is now selected.
    pub fn toggle_sublocation(&mut self, key: &str) -> Option<bool> {
        let entry = self.active_entry_mut()?;
        Some(sublocation::toggle_plain(&mut entry.sublocations, key))
    }

    /// Toggles a matrix region marker on the active disease.
    pub fn toggle_matrix_region(&mut self, region: &str) -> Option<bool> {
        let layout = SublocationLayout::for_location(&self.active.as_ref()?.loc);
        if layout.matrix_row(region).is_none_or(|row| row.is_heading) {
            tracing::debug!(region, "not a selectable region");
            return None;
        }
        let entry = self.active_entry_mut()?;
        Some(sublocation::toggle_region(&mut entry.sublocations, region))
    }

    /// Toggles a matrix option on the active disease.
    pub fn toggle_matrix_option(&mut self, region: &str, option: &str) -> Option<bool> {
        let layout = SublocationLayout::for_location(&self.active.as_ref()?.loc);
        let Some(row) = layout.matrix_row(region) else {
            tracing::debug!(region, "no such matrix row");
            return None;
        };
        let entry = self.active_entry_mut()?;
        Some(sublocation::toggle_matrix_option(
            &mut entry.sublocations,
            row,
            option,
        ))
    }

    /// Replaces the comments of the active disease.
    pub fn set_comments(&mut self, comments: &str) -> bool {
        match self.active_entry_mut() {
            Some(entry) => {
                entry.comments = comments.to_string();
                true
            }
            None => false,
        }
    }

    /// Sets the frame fields of the active disease.
    pub fn set_frames(
        &mut self,
        start: Option<i64>,
        end: Option<i64>,
        segmentation: Option<i64>,
    ) -> bool {
        let Some(entry) = self.active_entry_mut() else {
            return false;
        };
        entry.start_frame = start;
        entry.end_frame = end;
        entry.segmentation_frame = segmentation;
        if entry.frame_span().is_some_and(|span| span.is_inverted()) {
            tracing::warn!(?start, ?end, "end frame precedes start frame");
        }
        true
    }

    pub fn set_overall_remarks(&mut self, remarks: &str) {
        self.overall_remarks = remarks.to_string();
    }

    /// Empties the report, remarks and metadata.
    pub fn clear(&mut self) {
        self.report = Report::new();
        self.active = None;
        self.overall_remarks.clear();
        self.retro_meta = None;
        self.prosp_meta = None;
        tracing::info!("cleared report");
    }

    // ========================================================================
    // Schema changes
    // ========================================================================

    /// Installs a recompiled schema for the same procedure, keeping the
    /// report.
    ///
    /// Stored input groups are realigned to the re-parsed patterns with the
    /// same source text. Returns the number of realigned groups. A schema
    /// for another procedure is handled by [`Session::switch_procedure`].
    pub fn reload_schema(&mut self, schema: FindingSchema) -> usize {
        if schema.procedure != self.procedure() {
            self.switch_procedure(schema);
            return 0;
        }
        self.schema = schema;

        let mut realigned = 0;
        for (loc, location) in &mut self.report.locations {
            for (name, entry) in &mut location.diseases {
                let Some(disease) = self.schema.disease(name) else {
                    tracing::debug!(location = %loc, disease = %name, "disease left the schema");
                    continue;
                };
                for (section_name, section) in &mut entry.sections {
                    let Some(def) = disease.section(section_name) else {
                        continue;
                    };
                    realigned += realign_inputs(&mut section.inputs, def.as_scope().patterns());
                    for (sub_name, sub) in &mut section.subsections {
                        if let Some(sub_def) = def.subsection(sub_name) {
                            realigned +=
                                realign_inputs(&mut sub.inputs, sub_def.as_scope().patterns());
                        }
                    }
                    section.prune_empty_groups();
                }
            }
        }
        tracing::info!(diseases = self.schema.len(), realigned, "reloaded schema");
        realigned
    }

    /// Switches to the schema of another procedure, discarding the report.
    pub fn switch_procedure(&mut self, schema: FindingSchema) {
        tracing::info!(
            from = %self.procedure(),
            to = %schema.procedure,
            "switching procedure"
        );
        self.main_location = schema.procedure.first_location().to_string();
        self.schema = schema;
        self.report = Report::new();
        self.active = None;
    }

    // ========================================================================
    // Documents and live updates
    // ========================================================================

    /// Replaces the session state with a saved document.
    ///
    /// The last-active pointer is restored when it still names an entry,
    /// otherwise the first entry becomes active.
    pub fn load_document(&mut self, document: ReportDocument) {
        let last_active = document.last_active().cloned();
        let mut report = document.report;
        tidy_report(&mut report);

        self.report = report;
        self.overall_remarks = document.overall_remarks;
        self.retro_meta = document.retro_meta;
        self.prosp_meta = document.prosp_meta;
        self.active = last_active
            .filter(|p| self.report.contains(p))
            .or_else(|| self.report.first_pointer());
        if let Some(active) = &self.active {
            self.main_location = active.loc.clone();
        }
        tracing::info!(
            diseases = self.report.disease_count(),
            active = ?self.active,
            "loaded report document"
        );
    }

    /// Snapshot of the session as a saveable document.
    pub fn to_document(&self) -> ReportDocument {
        ReportDocument {
            retro_meta: self.retro_meta.clone(),
            prosp_meta: self.prosp_meta.clone(),
            meta: Some(SessionMeta {
                last_active: self.active.clone(),
            }),
            report: self.report.clone(),
            overall_remarks: self.overall_remarks.clone(),
        }
    }

    /// Atomically replaces the report with an externally produced one.
    ///
    /// Diseases unknown to the schema are dropped (unless the schema is
    /// empty), sub-locations are normalized and composite keys gain their
    /// region marker. The newest added entry becomes active; otherwise the
    /// current pointer is kept when still valid, else the first entry.
    pub fn apply_live_update(&mut self, update: LiveUpdate) -> LiveUpdateOutcome {
        let mut report = update.report;
        let mut outcome = LiveUpdateOutcome::default();

        if !self.schema.is_empty() {
            for (loc, location) in &mut report.locations {
                location.diseases.retain(|name, _| {
                    let known = self.schema.contains(name);
                    if !known {
                        tracing::warn!(
                            location = %loc,
                            disease = %name,
                            "dropping unknown disease from live update"
                        );
                        outcome.dropped.push(ActivePointer::new(loc.clone(), name.clone()));
                    }
                    known
                });
            }
        }
        tidy_report(&mut report);

        outcome.added = report
            .pointers()
            .filter(|p| !self.report.contains(p))
            .collect();

        self.report = report;
        if let Some(remarks) = update.overall_remarks {
            self.overall_remarks = remarks;
        }

        let previous = self.active.take().filter(|p| self.report.contains(p));
        self.active = outcome
            .added
            .last()
            .cloned()
            .or(previous)
            .or_else(|| self.report.first_pointer());
        if let Some(active) = &self.active {
            self.main_location = active.loc.clone();
        }

        tracing::info!(
            dropped = outcome.dropped.len(),
            added = outcome.added.len(),
            active = ?self.active,
            "applied live update"
        );
        outcome
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn active_parts(&mut self) -> Option<(&Disease, &mut DiseaseEntry)> {
        let active = self.active.as_ref()?;
        let disease = self.schema.disease(&active.disease)?;
        let entry = self.report.disease_mut(&active.loc, &active.disease)?;
        Some((disease, entry))
    }

    fn active_entry_mut(&mut self) -> Option<&mut DiseaseEntry> {
        let Some(active) = self.active.as_ref() else {
            tracing::debug!("no active disease");
            return None;
        };
        self.report.disease_mut(&active.loc, &active.disease)
    }
}

/// Normalizes sub-locations, removes empty input groups and empty
/// locations.
fn tidy_report(report: &mut Report) {
    normalize_report(report);
    for location in report.locations.values_mut() {
        for entry in location.diseases.values_mut() {
            sublocation::add_implied_regions(&mut entry.sublocations);
            for section in entry.sections.values_mut() {
                section.prune_empty_groups();
            }
        }
    }
    report.drop_empty_locations();
}

fn realign_inputs<'a>(
    inputs: &mut [InputEntry],
    patterns: impl Iterator<Item = &'a AttributePattern>,
) -> usize {
    let patterns: Vec<_> = patterns.collect();
    let mut realigned = 0;
    for input in inputs.iter_mut() {
        let InputEntry::Group(group) = input else {
            continue;
        };
        if let Some(pattern) = patterns.iter().find(|p| p.raw == group.raw_key) {
            group.realign(pattern.tokens.clone());
            realigned += 1;
        }
    }
    realigned
}
