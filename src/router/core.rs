use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{debug, warn};

use super::pattern::{split_path, Converter, Converters, PathPattern, Segment, TransportStyle};
use crate::error::NasseError;

/// Typed values captured from dynamic segments, keyed by segment name.
pub type Captures = Map<String, Value>;

/// Result of resolving a request path.
#[derive(Debug)]
pub struct RouteMatch<'r, T> {
    pub pattern: &'r PathPattern,
    pub value: &'r T,
    pub captures: Captures,
}

#[derive(Debug, Clone)]
struct Route<T> {
    pattern: PathPattern,
    value: T,
}

enum Attempt {
    Matched(Captures),
    Mismatch,
    Cast(NasseError),
}

/// Resolves request paths against registered patterns.
///
/// When several patterns accept a path, the one with the fewest dynamic
/// segments wins; ties go to the pattern registered first.
#[derive(Debug, Clone)]
pub struct Router<T> {
    routes: Vec<Route<T>>,
    converters: Converters,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            converters: Converters::default(),
        }
    }

    /// Add a user-defined capture type usable as `<name:segment>`.
    pub fn register_converter(&mut self, name: impl Into<String>, converter: Converter) {
        self.converters.register(name, converter);
    }

    #[must_use]
    pub fn converters(&self) -> &Converters {
        &self.converters
    }

    /// Register `value` under `pattern`.
    ///
    /// Registering the same pattern again replaces the value in place (keeping
    /// its registration order) and returns the previous one.
    pub fn insert(&mut self, pattern: PathPattern, value: T) -> Option<T> {
        if let Some(existing) = self.routes.iter_mut().find(|r| r.pattern == pattern) {
            warn!(pattern = %pattern, "Replaced existing route");
            return Some(std::mem::replace(&mut existing.value, value));
        }
        debug!(
            pattern = %pattern,
            dynamic_segments = pattern.dynamic_count(),
            total_routes = self.routes.len() + 1,
            "Route registered"
        );
        self.routes.push(Route { pattern, value });
        None
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathPattern, &T)> {
        self.routes.iter().map(|r| (&r.pattern, &r.value))
    }

    /// Every pattern projected into the host transport's dialect.
    #[must_use]
    pub fn transport_paths(&self, style: TransportStyle) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| r.pattern.to_transport(&self.converters, style))
            .collect()
    }

    /// Resolve a request path to the most specific matching route.
    ///
    /// Fails with [`NasseError::NotFound`] when no pattern has the right shape,
    /// or with the cast error of the most specific candidate when every
    /// candidate of the right shape rejected a dynamic segment.
    pub fn resolve(&self, path: &str) -> Result<RouteMatch<'_, T>, NasseError> {
        let match_start = Instant::now();
        let parts = split_path(path);

        let mut best: Option<(&Route<T>, Captures)> = None;
        let mut cast_failure: Option<(usize, NasseError)> = None;

        for route in &self.routes {
            let dynamic = route.pattern.dynamic_count();
            if let Some((current, _)) = &best {
                if current.pattern.dynamic_count() <= dynamic {
                    continue;
                }
            }
            match self.attempt(&route.pattern, &parts) {
                Attempt::Matched(captures) => best = Some((route, captures)),
                Attempt::Mismatch => {}
                Attempt::Cast(err) => {
                    let more_specific = cast_failure
                        .as_ref()
                        .map_or(true, |(count, _)| dynamic < *count);
                    if more_specific {
                        cast_failure = Some((dynamic, err));
                    }
                }
            }
        }

        match best {
            Some((route, captures)) => {
                debug!(
                    path = %path,
                    route_pattern = %route.pattern,
                    captures = ?captures,
                    duration_us = match_start.elapsed().as_micros(),
                    "Route matched"
                );
                Ok(RouteMatch {
                    pattern: &route.pattern,
                    value: &route.value,
                    captures,
                })
            }
            None => {
                debug!(
                    path = %path,
                    duration_us = match_start.elapsed().as_micros(),
                    "No route matched"
                );
                Err(cast_failure.map_or_else(
                    || NasseError::NotFound {
                        path: path.to_string(),
                    },
                    |(_, err)| err,
                ))
            }
        }
    }

    fn attempt(&self, pattern: &PathPattern, parts: &[&str]) -> Attempt {
        let segments = pattern.segments();
        if segments.len() != parts.len() {
            return Attempt::Mismatch;
        }
        let mut captures = Captures::new();
        let mut cast_error = None;
        for (segment, raw) in segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) => {
                    if lit.as_bytes() != raw.as_bytes() {
                        return Attempt::Mismatch;
                    }
                }
                Segment::Dynamic { name, kind } => {
                    if cast_error.is_some() {
                        continue;
                    }
                    match self.converters.resolve(kind).cast(raw) {
                        Ok(value) => {
                            captures.insert(name.clone(), value);
                        }
                        Err(reason) => {
                            cast_error = Some(NasseError::Validation {
                                name: name.clone(),
                                reason,
                            });
                        }
                    }
                }
            }
        }
        // literals are checked in full before a cast failure is reported
        match cast_error {
            Some(err) => Attempt::Cast(err),
            None => Attempt::Matched(captures),
        }
    }
}
