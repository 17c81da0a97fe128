//! Per-peer negotiation state machine.
//!
//! Pure: `transition` decides the next phase and what the caller must do
//! with the connection, and performs no I/O itself.
//!
//! ```text
//! Pending ──Initiate──▶ Negotiating{Offerer}  ──RemoteAnswer──▶ Negotiating{Offerer, applied}
//!    │                                                                │
//!    └──RemoteOffer──▶ Negotiating{Answerer, applied} ──TrackReceived─┴──▶ Connected
//!
//! any live phase ──Close──▶ Closed
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerPhase {
    /// Entry exists, no description exchanged yet.
    Pending,
    Negotiating {
        role: Role,
        /// The remote description has been applied.
        remote_applied: bool,
    },
    Connected,
    Closed,
}

impl PeerPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Negotiating { .. } => "negotiating",
            Self::Connected => "connected",
            Self::Closed => "closed",
        }
    }

    /// Remote candidates can only be applied once a remote description is in
    /// place; until then they are buffered.
    pub fn accepts_candidates(&self) -> bool {
        matches!(
            self,
            Self::Negotiating {
                remote_applied: true,
                ..
            } | Self::Connected
        )
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerInput {
    /// We are the newcomer and must offer.
    Initiate,
    RemoteOffer,
    RemoteAnswer,
    TrackReceived,
    Close,
}

/// Work the caller performs on the connection after advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    None,
    /// Create an offer, set it locally, relay it.
    SendOffer,
    /// Apply the remote offer, create an answer, set it locally, relay it.
    SendAnswer,
    /// Apply the remote answer.
    ApplyAnswer,
    /// Close the connection handle.
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advance { next: PeerPhase, directive: Directive },
    Reject(&'static str),
}

fn advance(next: PeerPhase, directive: Directive) -> Transition {
    Transition::Advance { next, directive }
}

pub fn transition(phase: PeerPhase, input: PeerInput) -> Transition {
    use PeerInput as I;
    use PeerPhase as P;

    match (phase, input) {
        (P::Closed, _) => Transition::Reject("connection closed"),
        (_, I::Close) => advance(P::Closed, Directive::Release),

        (P::Pending, I::Initiate) => advance(
            P::Negotiating {
                role: Role::Offerer,
                remote_applied: false,
            },
            Directive::SendOffer,
        ),
        (_, I::Initiate) => Transition::Reject("negotiation already started"),

        // Both sides offering at once would deadlock; only the newcomer
        // offers, so an offer racing ours is a protocol violation.
        (
            P::Negotiating {
                role: Role::Offerer,
                remote_applied: false,
            },
            I::RemoteOffer,
        ) => Transition::Reject("offer collides with our outstanding offer"),
        (P::Pending | P::Negotiating { .. }, I::RemoteOffer) => advance(
            P::Negotiating {
                role: Role::Answerer,
                remote_applied: true,
            },
            Directive::SendAnswer,
        ),
        (P::Connected, I::RemoteOffer) => advance(P::Connected, Directive::SendAnswer),

        (
            P::Negotiating {
                role: Role::Offerer,
                remote_applied: false,
            },
            I::RemoteAnswer,
        ) => advance(
            P::Negotiating {
                role: Role::Offerer,
                remote_applied: true,
            },
            Directive::ApplyAnswer,
        ),
        (_, I::RemoteAnswer) => Transition::Reject("answer without an outstanding offer"),

        (_, I::TrackReceived) => advance(P::Connected, Directive::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFERING: PeerPhase = PeerPhase::Negotiating {
        role: Role::Offerer,
        remote_applied: false,
    };

    fn next(phase: PeerPhase, input: PeerInput) -> (PeerPhase, Directive) {
        match transition(phase, input) {
            Transition::Advance { next, directive } => (next, directive),
            Transition::Reject(reason) => panic!("unexpected reject: {reason}"),
        }
    }

    #[test]
    fn offerer_path() {
        let (phase, d) = next(PeerPhase::Pending, PeerInput::Initiate);
        assert_eq!(phase, OFFERING);
        assert_eq!(d, Directive::SendOffer);
        assert!(!phase.accepts_candidates());

        let (phase, d) = next(phase, PeerInput::RemoteAnswer);
        assert_eq!(d, Directive::ApplyAnswer);
        assert!(phase.accepts_candidates());

        let (phase, _) = next(phase, PeerInput::TrackReceived);
        assert_eq!(phase, PeerPhase::Connected);
    }

    #[test]
    fn answerer_path() {
        let (phase, d) = next(PeerPhase::Pending, PeerInput::RemoteOffer);
        assert_eq!(d, Directive::SendAnswer);
        assert!(phase.accepts_candidates());
        assert_eq!(next(phase, PeerInput::TrackReceived).0, PeerPhase::Connected);
    }

    #[test]
    fn initiate_only_from_pending() {
        assert!(matches!(
            transition(OFFERING, PeerInput::Initiate),
            Transition::Reject(_)
        ));
        assert!(matches!(
            transition(PeerPhase::Connected, PeerInput::Initiate),
            Transition::Reject(_)
        ));
    }

    #[test]
    fn dangling_answer_is_rejected() {
        for phase in [
            PeerPhase::Pending,
            PeerPhase::Connected,
            PeerPhase::Negotiating {
                role: Role::Answerer,
                remote_applied: true,
            },
            PeerPhase::Negotiating {
                role: Role::Offerer,
                remote_applied: true,
            },
        ] {
            assert!(matches!(
                transition(phase, PeerInput::RemoteAnswer),
                Transition::Reject(_)
            ));
        }
    }

    #[test]
    fn colliding_offer_is_rejected() {
        assert!(matches!(
            transition(OFFERING, PeerInput::RemoteOffer),
            Transition::Reject(_)
        ));
    }

    #[test]
    fn connected_peer_can_renegotiate() {
        assert_eq!(
            next(PeerPhase::Connected, PeerInput::RemoteOffer),
            (PeerPhase::Connected, Directive::SendAnswer)
        );
    }

    #[test]
    fn close_is_terminal() {
        for phase in [PeerPhase::Pending, OFFERING, PeerPhase::Connected] {
            assert_eq!(
                next(phase, PeerInput::Close),
                (PeerPhase::Closed, Directive::Release)
            );
        }
        for input in [
            PeerInput::Initiate,
            PeerInput::RemoteOffer,
            PeerInput::RemoteAnswer,
            PeerInput::TrackReceived,
            PeerInput::Close,
        ] {
            assert!(matches!(
                transition(PeerPhase::Closed, input),
                Transition::Reject(_)
            ));
        }
    }
}
