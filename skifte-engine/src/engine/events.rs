//! The engine's event vocabulary. Everything both actors do is one of
//! these, popped from the timer queue in (time, sequence) order.

use skifte_core::resource::HolderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SimEvent {
    /// The adversary's current phase wait ran to completion.
    AttackWaitDone,
    /// The post-interruption penalty elapsed; restart the attack cycle.
    AttackResume,
    /// Registration loop wake-up.
    MtdRegisterTick,
    /// Trigger loop wake-up.
    MtdTriggerTick,
    /// An MTD execution task finished its execution-time wait.
    MtdExecDone { exec: HolderId },
}
