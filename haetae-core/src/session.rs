//! The portal session: one logged-in identity and everything scoped to it.
//!
//! Owns the session store, the trigger engine, the game controller, the
//! scheduler, and the session-local collections. Login resolves identity
//! and arms all timers synchronously in the same logical tick, so the UI
//! never observes a half-initialized agent. Logout cancels every timer and
//! clears the whole storage namespace; no timer survives it.

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::agent::{Agent, AgentRegistry, RentalRecord, RentalStatus};
use crate::aggregate;
use crate::data::NarrativeData;
use crate::eggs::{
    self, EasterEgg, EggAudience, SINKHOLE_DELAY_MS, SINKHOLE_INCIDENT_ID, SINKHOLE_NOTICE_ID,
    SINKHOLE_TOAST_BODY, SINKHOLE_TOAST_TITLE, ToastSpec,
};
use crate::game::{self, GAME_TICK_MS, GameController, GameOverType, GameSnapshot};
use crate::identity::{self, LoginError};
use crate::mode::BureauMode;
use crate::records::{
    ApprovalDocument, ApprovalStatus, ApprovalType, Equipment, EquipmentCategory, Incident,
    InspectionRequest, InspectionStatus, InspectionType, Message, Notification, Schedule,
    ScheduleType, VisitLocation,
};
use crate::scheduler::{Clock, Scheduler, SystemClock};
use crate::sequence::ExecutionSequence;
use crate::store::{SessionStore, StorageBackend, keys};
use crate::trigger::TriggerEngine;

/// Hyunmu standard issue, handed out at login when missing.
const HYUNMU_ISSUE_NAME: &str = "오방색 신발끈";
/// Delay before a bounce reply to a message sent to a resigned agent.
const AUTO_REPLY_DELAY_MS: u64 = 1_000;
/// Default approver for session-created documents.
const DEFAULT_APPROVER_ID: &str = "admin-001";
const DEFAULT_APPROVER_NAME: &str = "운영지원과장";

/// Timer payloads. Actions are data, not closures: cancelling the
/// scheduler is all it takes to guarantee nothing stale runs later.
#[derive(Debug, Clone, PartialEq)]
enum PortalAction {
    SinkholeReveal,
    EggDelivery { egg_id: String },
    GameTick,
    SequenceTick,
    AutoReply { message: Message },
}

/// Things a shell renders in response to `advance`.
#[derive(Debug, Clone, PartialEq)]
pub enum PortalEvent {
    Toast(ToastSpec),
    IncidentRevealed { id: String },
    NoticeArrived { id: String },
    MessageArrived { id: String },
    ContaminationChanged { value: u8 },
    GameOver { kind: GameOverType },
    ForcedLogout,
}

/// Session-scoped state container. One instance per active session; the
/// backing store's lifetime is the session's lifetime.
pub struct PortalSession<B: StorageBackend, C: Clock = SystemClock> {
    store: SessionStore<B>,
    registry: AgentRegistry,
    data: NarrativeData,
    eggs: Vec<EasterEgg>,
    clock: C,
    rng: ChaCha20Rng,
    scheduler: Scheduler<PortalAction>,
    agent: Option<Agent>,
    mode: BureauMode,
    game: GameController,
    triggers: TriggerEngine,
    sequence: ExecutionSequence,
    session_schedules: Vec<Schedule>,
    session_approvals: Vec<ApprovalDocument>,
    session_inspections: Vec<InspectionRequest>,
    session_messages: Vec<Message>,
    session_rentals: Vec<RentalRecord>,
    accepted_ids: Vec<String>,
    local_seq: u64,
}

impl<B: StorageBackend, C: Clock> PortalSession<B, C> {
    /// Build a session over `backend`. If the backend already holds an
    /// agent (page reload), the identity is restored and revalidated
    /// rather than reset.
    pub fn new(
        backend: B,
        registry: AgentRegistry,
        data: NarrativeData,
        eggs: Vec<EasterEgg>,
        seed: u64,
        clock: C,
    ) -> Self {
        let mut session = Self {
            store: SessionStore::new(backend),
            registry,
            data,
            eggs,
            clock,
            rng: ChaCha20Rng::seed_from_u64(seed),
            scheduler: Scheduler::new(),
            agent: None,
            mode: BureauMode::Ordinary,
            game: GameController::new(),
            triggers: TriggerEngine::new(),
            sequence: ExecutionSequence::default(),
            session_schedules: Vec::new(),
            session_approvals: Vec::new(),
            session_inspections: Vec::new(),
            session_messages: Vec::new(),
            session_rentals: Vec::new(),
            accepted_ids: Vec::new(),
            local_seq: 0,
        };
        if let Some(agent) = identity::load_current_agent(&session.store) {
            session.establish(agent);
        }
        session
    }

    /// Resolve a login key and establish the identity. Switching to a
    /// different identity reinitializes the whole namespace; logging the
    /// same identity back in (reload) restores it.
    pub fn login(&mut self, key: &str) -> Result<Agent, LoginError> {
        let resolved = identity::resolve_login(&self.registry, key, &mut self.rng)?;

        self.scheduler.cancel_all();
        self.sequence.reset();
        let switching = identity::load_current_agent(&self.store)
            .is_some_and(|previous| previous.id != resolved.id);
        if switching {
            self.store.clear_namespace();
        }

        self.establish(resolved.clone());
        Ok(resolved)
    }

    /// End the session: cancel every timer and wipe the namespace.
    pub fn logout(&mut self) {
        self.scheduler.cancel_all();
        self.sequence.reset();
        self.agent = None;
        self.mode = BureauMode::Ordinary;
        self.game.clear();
        self.triggers.reset();
        self.session_schedules.clear();
        self.session_approvals.clear();
        self.session_inspections.clear();
        self.session_messages.clear();
        self.session_rentals.clear();
        self.accepted_ids.clear();
        self.store.clear_namespace();
    }

    /// Load persisted state for `agent`, reconcile the game controller,
    /// and arm every timer. Runs synchronously within the login tick.
    fn establish(&mut self, agent: Agent) {
        identity::save_current_agent(&mut self.store, &agent);

        self.mode = self.store.load(keys::BUREAU_MODE, BureauMode::Ordinary);
        self.triggers = TriggerEngine::from_parts(
            self.store.load(keys::TRIGGERED_EVENTS, Vec::new()),
            self.store.load(keys::READ_NOTICES, Vec::new()),
        );
        self.session_schedules = self.store.load(keys::SESSION_SCHEDULES, Vec::new());
        self.session_approvals = self.store.load(keys::SESSION_APPROVALS, Vec::new());
        self.session_inspections = self.store.load(keys::SESSION_INSPECTIONS, Vec::new());
        self.session_messages = self.store.load(keys::SESSION_MESSAGES, Vec::new());
        self.accepted_ids = self.store.load(keys::ACCEPTED_INCIDENTS, Vec::new());

        let snapshot: GameSnapshot = self.store.load(keys::GAME_SESSION, GameSnapshot::default());
        if snapshot.agent_id.as_deref() == Some(agent.id.as_str()) {
            self.game.restore_from_session(&snapshot, &agent);
        } else {
            self.game.initialize_for_agent(&agent);
        }
        self.store.save(keys::GAME_SESSION, &self.game.snapshot());

        self.session_rentals = self.store.load(keys::SESSION_RENTALS, Vec::new());
        if self.session_rentals.is_empty() {
            self.session_rentals = initial_rentals(&agent, self.clock.now());
            self.store.save(keys::SESSION_RENTALS, &self.session_rentals);
        }

        self.arm_timers(&agent);
        self.agent = Some(agent);
    }

    fn arm_timers(&mut self, agent: &Agent) {
        if !game::loop_exempt(agent) {
            self.scheduler
                .arm_repeating(GAME_TICK_MS, PortalAction::GameTick);
        }

        if !self.triggers.has_fired(SINKHOLE_INCIDENT_ID) {
            self.scheduler
                .arm(SINKHOLE_DELAY_MS, PortalAction::SinkholeReveal);
        }

        let eggs: Vec<(String, u64)> = self
            .eggs
            .iter()
            .filter(|egg| match egg.audience {
                EggAudience::All => true,
                EggAudience::Ordinary => !eggs::is_named_agent(&agent.name),
            })
            .filter(|egg| !self.triggers.has_fired(&egg.id))
            .map(|egg| (egg.id.clone(), egg.delay_ms))
            .collect();
        for (egg_id, delay_ms) in eggs {
            self.scheduler
                .arm(delay_ms, PortalAction::EggDelivery { egg_id });
        }

        if self.game.game_over() == GameOverType::ForbiddenLogin {
            self.start_sequence();
        }
    }

    /// Pump the scheduler by `delta_ms` of elapsed time and apply every
    /// due action. Timers armed while applying (sequence ticks, delayed
    /// replies) keep firing within the same window until the budget is
    /// spent.
    pub fn advance(&mut self, delta_ms: u64) -> Vec<PortalEvent> {
        let mut events = Vec::new();
        let mut remaining = delta_ms;
        loop {
            match self.scheduler.next_due_in() {
                Some(offset) if offset <= remaining => {
                    remaining -= offset;
                    for action in self.scheduler.advance(offset) {
                        self.apply(action, &mut events);
                    }
                }
                _ => {
                    self.scheduler.advance(remaining);
                    return events;
                }
            }
        }
    }

    fn apply(&mut self, action: PortalAction, events: &mut Vec<PortalEvent>) {
        // Teardown cancels all timers; an action arriving without an
        // identity is dropped.
        let Some(agent) = self.agent.clone() else {
            return;
        };

        match action {
            PortalAction::SinkholeReveal => {
                let now = self.clock.now();
                if self.triggers.fire(SINKHOLE_INCIDENT_ID, now) {
                    self.triggers.fire(SINKHOLE_NOTICE_ID, now);
                    self.persist_triggers();
                    events.push(PortalEvent::Toast(ToastSpec::urgent(
                        SINKHOLE_TOAST_TITLE,
                        SINKHOLE_TOAST_BODY,
                    )));
                    events.push(PortalEvent::IncidentRevealed {
                        id: SINKHOLE_INCIDENT_ID.to_string(),
                    });
                    events.push(PortalEvent::NoticeArrived {
                        id: SINKHOLE_NOTICE_ID.to_string(),
                    });
                }
            }
            PortalAction::EggDelivery { egg_id } => {
                let Some(egg) = self.eggs.iter().find(|egg| egg.id == egg_id).cloned() else {
                    return;
                };
                if !self.triggers.fire(&egg.id, self.clock.now()) {
                    return;
                }
                self.persist_triggers();
                if let Some(mut message) = egg.message {
                    message.receiver_id = agent.id.clone();
                    let id = message.id.clone();
                    self.session_messages.push(message);
                    self.store
                        .save(keys::SESSION_MESSAGES, &self.session_messages);
                    events.push(PortalEvent::MessageArrived { id });
                }
                if let Some(toast) = egg.toast {
                    events.push(PortalEvent::Toast(toast));
                }
            }
            PortalAction::GameTick => {
                if self.game.tick(&agent, self.mode) {
                    self.store.save(keys::GAME_SESSION, &self.game.snapshot());
                    events.push(PortalEvent::ContaminationChanged {
                        value: self.game.contamination(),
                    });
                    if self.game.game_over().is_over() {
                        events.push(PortalEvent::GameOver {
                            kind: self.game.game_over(),
                        });
                    }
                }
            }
            PortalAction::SequenceTick => {
                let step = self.sequence.step();
                if step.finished {
                    self.logout();
                    events.push(PortalEvent::ForcedLogout);
                } else if let Some(delay_ms) = step.delay_ms {
                    self.scheduler.arm(delay_ms, PortalAction::SequenceTick);
                }
            }
            PortalAction::AutoReply { message } => {
                let id = message.id.clone();
                self.session_messages.push(message);
                self.store
                    .save(keys::SESSION_MESSAGES, &self.session_messages);
                events.push(PortalEvent::MessageArrived { id });
            }
        }
    }

    // ----- game state -----

    pub fn update_contamination(&mut self, value: i32) {
        let Some(agent) = self.agent.clone() else {
            return;
        };
        self.game.update_contamination(value, &agent, self.mode);
        self.store.save(keys::GAME_SESSION, &self.game.snapshot());
    }

    pub fn decrease_contamination(&mut self, amount: u8) {
        if self.agent.is_none() {
            return;
        }
        self.game.decrease_contamination(amount);
        self.store.save(keys::GAME_SESSION, &self.game.snapshot());
    }

    /// Force a game-over. The forbidden-login branch starts the execution
    /// sequence immediately.
    pub fn trigger_game_over(&mut self, kind: GameOverType) {
        if self.agent.is_none() {
            return;
        }
        self.game.trigger_game_over(kind);
        self.store.save(keys::GAME_SESSION, &self.game.snapshot());
        if kind == GameOverType::ForbiddenLogin && !self.sequence.is_running() {
            self.start_sequence();
        }
    }

    fn start_sequence(&mut self) {
        let delay_ms = self.sequence.begin();
        self.scheduler.arm(delay_ms, PortalAction::SequenceTick);
    }

    // ----- narrative triggers -----

    /// Idempotently record a trigger id as fired (scripted reveals,
    /// notification badges).
    pub fn fire_trigger(&mut self, id: &str) -> bool {
        let fired = self.triggers.fire(id, self.clock.now());
        if fired {
            self.persist_triggers();
        }
        fired
    }

    pub fn mark_read(&mut self, id: &str) {
        if self.triggers.mark_read(id) {
            self.store
                .save(keys::READ_NOTICES, &self.triggers.read_ids().to_vec());
        }
    }

    fn persist_triggers(&mut self) {
        self.store.save(
            keys::TRIGGERED_EVENTS,
            &self.triggers.triggered_ids().to_vec(),
        );
    }

    // ----- session-local additions -----

    pub fn accept_incident(&mut self, id: &str) {
        if self.agent.is_none() || self.accepted_ids.iter().any(|existing| existing == id) {
            return;
        }
        self.accepted_ids.push(id.to_string());
        self.store.save(keys::ACCEPTED_INCIDENTS, &self.accepted_ids);
    }

    pub fn add_schedule(
        &mut self,
        title: &str,
        schedule_type: ScheduleType,
        date: DateTime<Utc>,
    ) -> Option<Schedule> {
        self.agent.as_ref()?;
        let schedule = Schedule {
            id: self.next_id("sch"),
            title: title.to_string(),
            schedule_type,
            date,
            related_id: None,
        };
        self.session_schedules.push(schedule.clone());
        self.store
            .save(keys::SESSION_SCHEDULES, &self.session_schedules);
        Some(schedule)
    }

    pub fn add_visit_schedule(
        &mut self,
        location_id: &str,
        date: DateTime<Utc>,
    ) -> Option<Schedule> {
        self.agent.as_ref()?;
        let location = self.data.location_by_id(location_id)?.clone();
        let schedule = Schedule {
            id: self.next_id("sch-visit"),
            title: format!("{} 방문", location.name),
            schedule_type: ScheduleType::VisitReservation,
            date,
            related_id: Some(location.id),
        };
        self.session_schedules.push(schedule.clone());
        self.store
            .save(keys::SESSION_SCHEDULES, &self.session_schedules);
        Some(schedule)
    }

    pub fn add_approval(
        &mut self,
        doc_type: ApprovalType,
        title: &str,
        content: &str,
        related_incident_id: Option<&str>,
    ) -> Option<ApprovalDocument> {
        let agent = self.agent.clone()?;
        let doc = ApprovalDocument {
            id: self.next_id("apv"),
            doc_type,
            title: title.to_string(),
            content: content.to_string(),
            status: ApprovalStatus::Pending,
            created_by: agent.id,
            created_by_name: agent.name,
            approver: DEFAULT_APPROVER_ID.to_string(),
            approver_name: DEFAULT_APPROVER_NAME.to_string(),
            created_at: self.clock.now(),
            processed_at: None,
            related_incident_id: related_incident_id.map(str::to_string),
            reject_reason: None,
        };
        // Newest submission first.
        self.session_approvals.insert(0, doc.clone());
        self.store
            .save(keys::SESSION_APPROVALS, &self.session_approvals);
        Some(doc)
    }

    /// File an inspection request; a paired reservation schedule is
    /// appended as well.
    pub fn add_inspection(
        &mut self,
        inspection_type: InspectionType,
        date: DateTime<Utc>,
        symptoms: &str,
    ) -> Option<InspectionRequest> {
        let agent = self.agent.clone()?;
        let request = InspectionRequest {
            id: self.next_id("insp"),
            agent_id: agent.id,
            inspection_type,
            status: InspectionStatus::Requested,
            scheduled_date: date,
            symptoms: (!symptoms.is_empty()).then(|| symptoms.to_string()),
            result: None,
            created_at: self.clock.now(),
        };
        self.session_inspections.insert(0, request.clone());
        self.store
            .save(keys::SESSION_INSPECTIONS, &self.session_inspections);

        let schedule = Schedule {
            id: self.next_id("sch-insp"),
            title: format!("{} 예약", inspection_type.as_str()),
            schedule_type: ScheduleType::VisitReservation,
            date,
            related_id: Some(request.id.clone()),
        };
        self.session_schedules.push(schedule);
        self.store
            .save(keys::SESSION_SCHEDULES, &self.session_schedules);
        Some(request)
    }

    pub fn add_rental(
        &mut self,
        equipment_id: &str,
        days: i64,
        quantity: u32,
    ) -> Option<RentalRecord> {
        self.agent.as_ref()?;
        let equipment = self.data.equipment_by_id(equipment_id)?.clone();
        let now = self.clock.now();
        let rental = RentalRecord {
            id: self.next_id("rental"),
            equipment_name: equipment.name,
            category: equipment.category,
            rental_date: now,
            due_date: Some(now + Duration::days(days)),
            status: RentalStatus::Ok,
            quantity,
        };
        self.session_rentals.push(rental.clone());
        self.store.save(keys::SESSION_RENTALS, &self.session_rentals);
        Some(rental)
    }

    /// Send a message from the current agent. Addressing a resigned
    /// persona schedules a delayed delivery-failure reply from the system.
    pub fn send_message(&mut self, recipient: &str, title: &str, content: &str) -> Option<Message> {
        let agent = self.agent.clone()?;
        let resolved = self
            .registry
            .by_id(recipient)
            .or_else(|| self.registry.by_key(recipient))
            .cloned();
        let receiver_id = resolved
            .as_ref()
            .map_or_else(|| recipient.to_string(), |found| found.id.clone());

        let message = Message {
            id: self.next_id("msg-sent"),
            sender_id: agent.id.clone(),
            sender_name: agent.name.clone(),
            sender_department: agent.department.label().to_string(),
            receiver_id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: self.clock.now(),
            is_read: true,
            trigger: None,
        };
        self.session_messages.push(message.clone());
        self.store
            .save(keys::SESSION_MESSAGES, &self.session_messages);

        if let Some(found) = resolved {
            if !found.is_active() {
                let reply = Message {
                    id: self.next_id("msg-reply"),
                    sender_id: "system".to_string(),
                    sender_name: "시스템".to_string(),
                    sender_department: "전산팀".to_string(),
                    receiver_id: agent.id,
                    title: "[발신 실패] 수신자 불명".to_string(),
                    content: format!(
                        "수신자({})는 현재 재직 중이 아닙니다. 메시지를 전송할 수 없습니다.",
                        found.name
                    ),
                    created_at: self.clock.now(),
                    is_read: false,
                    trigger: None,
                };
                self.scheduler
                    .arm(AUTO_REPLY_DELAY_MS, PortalAction::AutoReply { message: reply });
            }
        }
        Some(message)
    }

    // ----- mode -----

    pub fn set_mode(&mut self, mode: BureauMode) {
        self.mode = mode;
        self.store.save(keys::BUREAU_MODE, &mode);
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    // ----- derived views -----

    #[must_use]
    pub fn incidents(&self) -> Vec<Incident> {
        let Some(agent) = &self.agent else {
            return Vec::new();
        };
        aggregate::processed_incidents(
            &self.data,
            agent,
            self.mode,
            &self.accepted_ids,
            &self.triggers,
        )
    }

    #[must_use]
    pub fn schedules(&self) -> Vec<Schedule> {
        let Some(agent) = &self.agent else {
            return Vec::new();
        };
        let incidents = self.incidents();
        aggregate::combined_schedules(
            &self.data,
            agent,
            self.mode,
            &self.session_schedules,
            &incidents,
            self.clock.now(),
        )
    }

    #[must_use]
    pub fn approvals(&self) -> Vec<ApprovalDocument> {
        let Some(agent) = &self.agent else {
            return Vec::new();
        };
        aggregate::combined_approvals(&self.data, agent, self.mode, &self.session_approvals)
    }

    #[must_use]
    pub fn inspections(&self) -> Vec<InspectionRequest> {
        let Some(agent) = &self.agent else {
            return Vec::new();
        };
        aggregate::combined_inspections(&self.data, agent, &self.session_inspections)
    }

    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        let Some(agent) = &self.agent else {
            return Vec::new();
        };
        aggregate::combined_notifications(&self.data, agent, &self.triggers)
    }

    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        let Some(agent) = &self.agent else {
            return Vec::new();
        };
        aggregate::combined_messages(&self.data, agent, &self.triggers, &self.session_messages)
    }

    #[must_use]
    pub fn rentals(&self) -> &[RentalRecord] {
        &self.session_rentals
    }

    #[must_use]
    pub fn equipment(&self) -> &[Equipment] {
        self.data.equipment()
    }

    #[must_use]
    pub fn locations(&self) -> &[VisitLocation] {
        self.data.locations()
    }

    // ----- accessors -----

    #[must_use]
    pub fn agent(&self) -> Option<&Agent> {
        self.agent.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.agent.is_some()
    }

    #[must_use]
    pub const fn mode(&self) -> BureauMode {
        self.mode
    }

    #[must_use]
    pub const fn contamination(&self) -> u8 {
        self.game.contamination()
    }

    #[must_use]
    pub const fn game_over(&self) -> GameOverType {
        self.game.game_over()
    }

    #[must_use]
    pub const fn sequence(&self) -> &ExecutionSequence {
        &self.sequence
    }

    #[must_use]
    pub fn accepted_ids(&self) -> &[String] {
        &self.accepted_ids
    }

    #[must_use]
    pub fn triggered_ids(&self) -> &[String] {
        self.triggers.triggered_ids()
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore<B> {
        &self.store
    }

    /// Consume the session, returning the backend (simulates keeping the
    /// tab's storage across a page reload).
    #[must_use]
    pub fn into_backend(self) -> B {
        self.store.into_backend()
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.local_seq += 1;
        format!(
            "{prefix}-{}-{}",
            self.clock.now().timestamp_millis(),
            self.local_seq
        )
    }
}

fn initial_rentals(agent: &Agent, now: DateTime<Utc>) -> Vec<RentalRecord> {
    let mut rentals = agent.rentals.clone();
    if agent.department == crate::agent::Department::Hyunmu
        && !rentals
            .iter()
            .any(|rental| rental.equipment_name == HYUNMU_ISSUE_NAME)
    {
        rentals.push(RentalRecord {
            id: format!("rental-issue-{}", agent.id),
            equipment_name: HYUNMU_ISSUE_NAME.to_string(),
            category: EquipmentCategory::Issued,
            rental_date: now,
            due_date: None,
            status: RentalStatus::Ok,
            quantity: 1,
        });
    }
    rentals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eggs::builtin_eggs;
    use crate::store::MemoryBackend;

    fn manual_clock() -> crate::scheduler::ManualClock {
        crate::scheduler::ManualClock::starting_at("2025-08-06T09:00:00Z".parse().unwrap())
    }

    fn open(seed: u64) -> PortalSession<MemoryBackend, crate::scheduler::ManualClock> {
        PortalSession::new(
            MemoryBackend::new(),
            AgentRegistry::builtin().clone(),
            NarrativeData::builtin().clone(),
            builtin_eggs().to_vec(),
            seed,
            manual_clock(),
        )
    }

    #[test]
    fn login_establishes_identity_and_arms_timers() {
        let mut session = open(1);
        let agent = session.login("김솔음").unwrap();
        assert_eq!(agent.persona_key(), Some("solum"));
        assert!(session.is_authenticated());
        assert_eq!(session.contamination(), agent.contamination);
        // Game loop + sinkhole + haunted egg are armed... except the
        // haunted egg skips named agents, so: loop + sinkhole.
        assert_eq!(session.pending_timers(), 2);
    }

    #[test]
    fn ordinary_agent_gets_the_haunted_egg_timer() {
        let mut session = open(2);
        session.login("이평범").unwrap();
        assert_eq!(session.pending_timers(), 3);
    }

    #[test]
    fn loop_exempt_persona_has_no_game_tick() {
        let mut session = open(3);
        session.login("박홍림").unwrap();
        // Sinkhole only.
        assert_eq!(session.pending_timers(), 1);
        let baseline = session.contamination();
        let events = session.advance(GAME_TICK_MS * 3);
        assert!(
            events
                .iter()
                .all(|e| !matches!(e, PortalEvent::ContaminationChanged { .. }))
        );
        assert_eq!(session.contamination(), baseline);
    }

    #[test]
    fn contamination_drifts_on_the_game_tick() {
        let mut session = open(4);
        let agent = session.login("김솔음").unwrap();
        let events = session.advance(GAME_TICK_MS);
        assert!(events.contains(&PortalEvent::ContaminationChanged {
            value: agent.contamination + 1
        }));
    }

    #[test]
    fn logout_cancels_timers_and_clears_namespace() {
        let mut session = open(5);
        session.login("이평범").unwrap();
        session.accept_incident("inc-001");
        session.logout();

        assert!(!session.is_authenticated());
        assert_eq!(session.pending_timers(), 0);
        assert!(session.store().backend().is_empty());
        assert!(session.advance(120_000).is_empty());
    }

    #[test]
    fn switching_identity_reinitializes_instead_of_merging() {
        let mut session = open(6);
        session.login("김솔음").unwrap();
        session.accept_incident("inc-001");
        session.update_contamination(90);

        let other = session.login("최요원").unwrap();
        assert_eq!(session.contamination(), other.contamination);
        assert!(session.accepted_ids().is_empty());
    }

    #[test]
    fn send_message_to_resigned_agent_bounces_after_delay() {
        let mut session = open(7);
        session.login("이평범").unwrap();
        session.send_message("koyoungeun", "안부", "잘 지내십니까").unwrap();

        let before = session.messages();
        assert!(before.iter().any(|m| m.title == "안부"));
        assert!(!before.iter().any(|m| m.title.starts_with("[발신 실패]")));

        let events = session.advance(AUTO_REPLY_DELAY_MS);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, PortalEvent::MessageArrived { .. }))
        );
        let after = session.messages();
        let bounce = after
            .iter()
            .find(|m| m.title.starts_with("[발신 실패]"))
            .expect("bounce reply delivered");
        assert_eq!(bounce.sender_id, "system");
        assert!(bounce.content.contains("고영은"));
    }

    #[test]
    fn hyunmu_agent_is_issued_the_shoelace() {
        let mut session = open(8);
        session.login("박홍림").unwrap();
        assert!(
            session
                .rentals()
                .iter()
                .any(|rental| rental.equipment_name == HYUNMU_ISSUE_NAME)
        );

        // Idempotent across a reload of the same identity.
        let backend = session.into_backend();
        let resumed = PortalSession::new(
            backend,
            AgentRegistry::builtin().clone(),
            NarrativeData::builtin().clone(),
            builtin_eggs().to_vec(),
            9,
            manual_clock(),
        );
        let count = resumed
            .rentals()
            .iter()
            .filter(|rental| rental.equipment_name == HYUNMU_ISSUE_NAME)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn forbidden_login_runs_the_sequence_to_forced_logout() {
        let mut session = open(10);
        session.login("이평범").unwrap();
        session.trigger_game_over(GameOverType::ForbiddenLogin);
        assert!(session.sequence().is_running());

        let mut saw_logout = false;
        for _ in 0..100 {
            let events = session.advance(5_000);
            if events.contains(&PortalEvent::ForcedLogout) {
                saw_logout = true;
                break;
            }
        }
        assert!(saw_logout, "sequence never forced logout");
        assert!(!session.is_authenticated());
        assert!(session.store().backend().is_empty());
    }

    #[test]
    fn visit_and_inspection_create_schedules() {
        let mut session = open(11);
        session.login("이평범").unwrap();
        let date: DateTime<Utc> = "2025-08-09T14:00:00Z".parse().unwrap();

        session.add_visit_schedule("loc-001", date).unwrap();
        session
            .add_inspection(InspectionType::Thorough, date, "손끝 감각 저하")
            .unwrap();

        let schedules = session.schedules();
        assert!(schedules.iter().any(|s| s.title == "용천 선녀탕 방문"));
        assert!(schedules.iter().any(|s| s.title == "정밀검사 예약"));
        assert_eq!(session.inspections().len(), 1);
    }

    #[test]
    fn add_rental_draws_from_the_equipment_catalog() {
        let mut session = open(12);
        session.login("이평범").unwrap();
        let rental = session.add_rental("eq-001", 3, 1).unwrap();
        assert_eq!(rental.equipment_name, "정화 부적 세트");
        assert!(rental.due_date.is_some());
        assert!(session.add_rental("eq-missing", 1, 1).is_none());
    }

    #[test]
    fn actions_without_identity_are_noops() {
        let mut session = open(13);
        session.update_contamination(90);
        session.accept_incident("inc-001");
        assert!(session.add_schedule("x", ScheduleType::Duty, Utc::now()).is_none());
        assert!(session.send_message("solum", "a", "b").is_none());
        assert_eq!(session.contamination(), 0);
        assert!(session.incidents().is_empty());
    }
}
