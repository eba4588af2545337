use crate::ai::{AiConfig, AiMessage, CompletionRequest, ReasoningClient};
use crate::analysis::prompt::{build_context, parse_ai_response, SYSTEM_PROMPT};
use crate::analysis::{Alert, AnalysisConfig, HeuristicAnalyzer, Severity};
use crate::notify::Notifier;
use crate::robot::{RobotRegistry, RobotSnapshot};
use crate::suggestion::{NewSuggestion, Suggestion, SuggestionStore};
use anyhow::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Notification type for every suggestion produced by the pipeline
pub const SUGGESTION_NOTIFICATION: &str = "ai.suggestion";

/// Orchestrates heuristic analysis, AI escalation and the proximity scan.
///
/// Alerts that need deeper reasoning go onto an unbounded FIFO drained by a
/// single worker task; everything else becomes a heuristic suggestion
/// immediately. Every path ends in exactly one stored and broadcast
/// suggestion per alert.
pub struct AnalysisService {
    analyzer: HeuristicAnalyzer,
    config: AnalysisConfig,
    ai: AiConfig,
    registry: Arc<RobotRegistry>,
    suggestions: Arc<SuggestionStore>,
    notifier: Arc<Notifier>,
    reasoning: Option<Arc<dyn ReasoningClient>>,
    queue_tx: mpsc::UnboundedSender<Alert>,
    queue_rx: Mutex<Option<mpsc::UnboundedReceiver<Alert>>>,
    /// Last time and severity each cooldown key produced a suggestion
    last_alerted: DashMap<(String, String, Option<String>), (Instant, Severity)>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl AnalysisService {
    pub fn new(
        config: AnalysisConfig,
        ai: AiConfig,
        registry: Arc<RobotRegistry>,
        suggestions: Arc<SuggestionStore>,
        notifier: Arc<Notifier>,
        reasoning: Option<Arc<dyn ReasoningClient>>,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Self {
            analyzer: HeuristicAnalyzer::new(config.thresholds.clone()),
            config,
            ai,
            registry,
            suggestions,
            notifier,
            reasoning,
            queue_tx,
            queue_rx: Mutex::new(Some(queue_rx)),
            last_alerted: DashMap::new(),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// True when alerts flagged `requires_ai` are escalated rather than
    /// turned into heuristic suggestions directly
    pub fn ai_enabled(&self) -> bool {
        self.ai.enabled && self.reasoning.is_some()
    }

    /// Spawn the escalation worker (when AI is enabled) and the proximity scanner
    pub async fn start(self: &Arc<Self>) {
        let mut handles = self.handles.lock().await;

        if self.ai_enabled() {
            if let Some(rx) = self.queue_rx.lock().await.take() {
                let service = Arc::clone(self);
                handles.push(tokio::spawn(async move { service.run_worker(rx).await }));
                info!(provider = self.reasoning_name(), "AI escalation worker started");
            }
        } else {
            info!("AI escalation disabled, alerts produce heuristic suggestions directly");
        }

        let service = Arc::clone(self);
        handles.push(tokio::spawn(async move { service.run_proximity_loop().await }));
        info!(
            interval_secs = self.config.proximity_interval_seconds,
            "Proximity scanner started"
        );
    }

    /// Abort background tasks and wait for them to unwind
    pub async fn stop(&self) {
        let handles: Vec<JoinHandle<()>> = self.handles.lock().await.drain(..).collect();
        for handle in &handles {
            handle.abort();
        }
        for handle in handles {
            let _ = handle.await;
        }
        info!("Analysis service stopped");
    }

    /// Run per-robot heuristics on a fresh snapshot and route the resulting alerts
    pub fn on_telemetry(&self, robot: &RobotSnapshot) {
        for alert in self.analyzer.analyze(robot) {
            self.route(alert);
        }
    }

    /// One pass of the fleet-wide proximity check. Returns the number of
    /// alerts routed after cooldown filtering.
    pub fn scan_proximity(&self) -> usize {
        let robots = self.registry.all();
        let mut routed = 0;
        for alert in self.analyzer.check_proximity(&robots) {
            if self.route(alert) {
                routed += 1;
            }
        }
        routed
    }

    /// Queue `alert` for AI reasoning or turn it into a heuristic suggestion now
    pub fn process_alert(&self, alert: Alert) {
        if alert.requires_ai && self.ai_enabled() {
            debug!(robot_id = %alert.robot_id, alert_type = %alert.alert_type, "Alert queued for AI");
            if let Err(mpsc::error::SendError(alert)) = self.queue_tx.send(alert) {
                warn!(robot_id = %alert.robot_id, "Escalation queue closed, using heuristic suggestion");
                self.record(NewSuggestion::ai_fallback(&alert));
            }
            return;
        }
        self.record(NewSuggestion::from_alert(&alert));
    }

    /// Reason about one alert and store the resulting suggestion.
    ///
    /// Returns None only when the robot is no longer registered. Call or
    /// parse failures produce the heuristic fallback.
    pub async fn escalate(&self, alert: Alert) -> Option<Suggestion> {
        let Some(robot) = self.registry.get(&alert.robot_id) else {
            debug!(robot_id = %alert.robot_id, "Robot gone, dropping queued alert");
            return None;
        };

        let new = match self.reason(&robot, &alert).await {
            Ok(content) => match parse_ai_response(&content, &alert, self.ai.default_confidence) {
                Ok(suggestion) => suggestion,
                Err(e) => {
                    warn!(robot_id = %alert.robot_id, error = %e, "Unusable AI response, falling back");
                    NewSuggestion::ai_fallback(&alert)
                }
            },
            Err(e) => {
                warn!(robot_id = %alert.robot_id, error = %e, "AI call failed, falling back");
                NewSuggestion::ai_fallback(&alert)
            }
        };

        Some(self.record(new))
    }

    /// Apply the cooldown then process. Returns whether the alert was routed.
    fn route(&self, alert: Alert) -> bool {
        if !self.cooldown_allows(&alert) {
            debug!(
                robot_id = %alert.robot_id,
                alert_type = %alert.alert_type,
                "Alert suppressed by cooldown"
            );
            return false;
        }
        self.process_alert(alert);
        true
    }

    /// Repeats of the same key are suppressed inside the window unless the
    /// severity rose since the last routed alert.
    fn cooldown_allows(&self, alert: &Alert) -> bool {
        let window = Duration::from_secs(self.config.alert_cooldown_seconds);
        if window.is_zero() {
            return true;
        }
        let now = Instant::now();
        match self.last_alerted.entry(alert.cooldown_key()) {
            Entry::Occupied(mut last) => {
                let (at, severity) = *last.get();
                if now.duration_since(at) < window && alert.severity <= severity {
                    return false;
                }
                last.insert((now, alert.severity));
                true
            }
            Entry::Vacant(slot) => {
                slot.insert((now, alert.severity));
                true
            }
        }
    }

    async fn reason(&self, robot: &RobotSnapshot, alert: &Alert) -> Result<String> {
        let client = self
            .reasoning
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No reasoning client configured"))?;

        let request = CompletionRequest {
            messages: vec![
                AiMessage::system(SYSTEM_PROMPT),
                AiMessage::user(build_context(robot, alert)),
            ],
            temperature: self.ai.temperature,
            max_tokens: self.ai.max_tokens,
        };

        let backoff = Duration::from_millis(self.ai.retry_backoff_ms);
        let mut attempt = 0;
        loop {
            match client.complete(&request).await {
                Ok(content) => return Ok(content),
                Err(e) if attempt < self.ai.retry_attempts => {
                    attempt += 1;
                    warn!(
                        provider = client.name(),
                        attempt,
                        error = %e,
                        "AI call failed, retrying"
                    );
                    time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn record(&self, new: NewSuggestion) -> Suggestion {
        let suggestion = self.suggestions.create(new);
        info!(
            suggestion_id = %suggestion.id,
            robot_id = %suggestion.robot_id,
            severity = %suggestion.severity,
            source = %suggestion.source,
            title = %suggestion.title,
            "Suggestion created"
        );
        self.notifier.broadcast_json(SUGGESTION_NOTIFICATION, &suggestion);
        suggestion
    }

    async fn run_worker(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<Alert>) {
        while let Some(alert) = rx.recv().await {
            self.escalate(alert).await;
        }
        warn!("Escalation queue closed, worker exiting");
    }

    async fn run_proximity_loop(self: Arc<Self>) {
        let mut interval = time::interval(Duration::from_secs(self.config.proximity_interval_seconds.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await; // first tick fires immediately; robots have no positions yet

        loop {
            interval.tick().await;

            // Run each scan as its own task so a panic is contained to one cycle
            let service = Arc::clone(&self);
            match tokio::spawn(async move { service.scan_proximity() }).await {
                Ok(0) => {}
                Ok(routed) => debug!(routed, "Proximity scan raised alerts"),
                Err(e) => error!(error = %e, "Proximity scan failed"),
            }
        }
    }

    fn reasoning_name(&self) -> &str {
        self.reasoning.as_ref().map(|c| c.name()).unwrap_or("none")
    }
}
