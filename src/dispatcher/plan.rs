use tracing::debug;

/// Context slots a handler may ask for, by argument name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    App,
    Endpoint,
    Request,
    Method,
    Values,
    Params,
    Args,
    Form,
    Headers,
    Account,
}

impl Slot {
    /// Every bindable argument name.
    pub const NAMES: [&'static str; 10] = [
        "app", "endpoint", "request", "method", "values", "params", "args", "form", "headers",
        "account",
    ];

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let slot = match name {
            "app" => Slot::App,
            "endpoint" => Slot::Endpoint,
            "request" => Slot::Request,
            "method" => Slot::Method,
            "values" => Slot::Values,
            "params" => Slot::Params,
            "args" => Slot::Args,
            "form" => Slot::Form,
            "headers" => Slot::Headers,
            "account" => Slot::Account,
            _ => return None,
        };
        Some(slot)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Slot::App => "app",
            Slot::Endpoint => "endpoint",
            Slot::Request => "request",
            Slot::Method => "method",
            Slot::Values => "values",
            Slot::Params => "params",
            Slot::Args => "args",
            Slot::Form => "form",
            Slot::Headers => "headers",
            Slot::Account => "account",
        }
    }
}

/// The slots one handler binds, computed once at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    slots: Vec<Slot>,
}

impl Plan {
    /// Build a plan from declared argument names. Names outside the closed
    /// set are left out.
    #[must_use]
    pub fn from_names(names: &[&str]) -> Self {
        let mut slots = Vec::with_capacity(names.len());
        for name in names {
            match Slot::from_name(name) {
                Some(slot) if !slots.contains(&slot) => slots.push(slot),
                Some(_) => {}
                None => debug!(argument = %name, "Handler argument is not bindable, omitted"),
            }
        }
        Self { slots }
    }

    #[must_use]
    pub fn contains(&self, slot: Slot) -> bool {
        self.slots.contains(&slot)
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Whether the handler consumes the authenticated account.
    #[must_use]
    pub fn wants_account(&self) -> bool {
        self.contains(Slot::Account)
    }
}
