use crate::model::CalendarEvent;

/// Descriptions longer than this get a collapsed view and a toggle.
pub const DESCRIPTION_TOGGLE_THRESHOLD: usize = 300;

/// Whether a description needs the show more / show less toggle.
pub fn description_needs_toggle(description: &str) -> bool {
    description.chars().count() > DESCRIPTION_TOGGLE_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Open {
        event: Box<CalendarEvent>,
        description_expanded: bool,
    },
}

/// Focus on at most one event, shown in the detail popup.
#[derive(Debug, Clone, Default)]
pub struct EventModal {
    state: ModalState,
}

impl EventModal {
    pub fn open(&mut self, event: CalendarEvent) {
        self.state = ModalState::Open {
            event: Box::new(event),
            description_expanded: false,
        };
    }

    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = ModalState::Closed;
        was_open
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Open { .. })
    }

    pub fn event(&self) -> Option<&CalendarEvent> {
        match &self.state {
            ModalState::Open { event, .. } => Some(event.as_ref()),
            ModalState::Closed => None,
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(
            self.state,
            ModalState::Open {
                description_expanded: true,
                ..
            }
        )
    }

    pub fn has_toggle(&self) -> bool {
        self.event()
            .and_then(|e| e.metadata.description.as_deref())
            .is_some_and(description_needs_toggle)
    }

    /// Flips the description between collapsed and expanded. Ignored when the
    /// description is short enough to show in full.
    pub fn toggle_description(&mut self) {
        let has_toggle = self.has_toggle();
        if let ModalState::Open {
            description_expanded,
            ..
        } = &mut self.state
        {
            if has_toggle {
                *description_expanded = !*description_expanded;
            }
        }
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }
}
