#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavState {
    #[default]
    Init,
    Resolving,
    Synced,
    Navigating,
}

impl std::fmt::Display for NavState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::Resolving => "resolving",
            Self::Synced => "synced",
            Self::Navigating => "navigating",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    Mount,
    RouteChanged,
    HistoryPopped,
    LookupSucceeded,
    LookupFailed,
    CrumbClicked,
}

pub fn next_state(current: NavState, event: NavEvent) -> NavState {
    match event {
        NavEvent::Mount | NavEvent::RouteChanged | NavEvent::HistoryPopped => NavState::Resolving,
        // A completion only lands on a cycle that is still resolving.
        NavEvent::LookupSucceeded | NavEvent::LookupFailed => match current {
            NavState::Resolving => NavState::Synced,
            other => other,
        },
        NavEvent::CrumbClicked => NavState::Navigating,
    }
}

pub fn transition(current: NavState, event: NavEvent) -> (NavState, bool) {
    let next = next_state(current, event);
    (next, next != current)
}
