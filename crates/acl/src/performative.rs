//! Standard performative labels.
//!
//! A performative is the speech-act label of a message ("what kind of
//! utterance is this") and doubles as the primary dispatch key. The constants
//! here cover the exchanges the built-in builders speak; custom labels are
//! plain strings and need no registration.

/// Ask the receiver to perform an action.
pub const REQUEST: &str = "request";

/// Ask the receiver to submit a proposal for a task.
pub const REQUEST_PROPOSAL: &str = "request_proposal";

/// Ask a supervising agent to approve a pending step.
pub const REQUEST_APPROVAL: &str = "request_approval";

/// Share information with the receiver.
pub const INFORM: &str = "inform";

/// Confirm receipt or completion of a prior message.
pub const ACKNOWLEDGE: &str = "acknowledge";

/// Report that a requested action could not be carried out.
pub const FAILURE: &str = "failure";

/// Offer to perform a task, typically answering `request_proposal`.
pub const PROPOSE: &str = "propose";

/// Accept a received proposal.
pub const ACCEPT: &str = "accept";

/// Decline a received proposal or request.
pub const REFUSE: &str = "refuse";
