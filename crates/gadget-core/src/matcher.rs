//! Compiled routes and priority-ordered pattern matching.

use crate::error::RouteError;
use crate::route::{EventRoute, Handler, Route};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// A route with its pattern compiled once at registration.
pub struct CompiledRoute<E> {
    route: Route,
    matcher: Option<Regex>,
    handler: Arc<dyn Handler<E>>,
}

impl<E> CompiledRoute<E> {
    /// Compile the route's pattern. An empty pattern yields no matcher.
    pub fn compile(def: EventRoute<E>) -> Result<Self, RouteError> {
        let matcher = compile_pattern(&def.route)?;
        Ok(Self {
            route: def.route,
            matcher,
            handler: def.handler,
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn name(&self) -> &str {
        &self.route.name
    }

    pub fn priority(&self) -> i32 {
        self.route.priority
    }

    pub fn matcher(&self) -> Option<&Regex> {
        self.matcher.as_ref()
    }

    /// Routes without a pattern never match.
    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Capture groups of the pattern against `text`, index 0 being the
    /// whole match. Empty when nothing matches.
    pub fn captures(&self, text: &str) -> Vec<Option<String>> {
        self.matcher
            .as_ref()
            .and_then(|re| re.captures(text))
            .map(|caps| {
                caps.iter()
                    .map(|m| m.map(|m| m.as_str().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn handler(&self) -> Arc<dyn Handler<E>> {
        Arc::clone(&self.handler)
    }
}

impl<E> fmt::Debug for CompiledRoute<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("route", &self.route)
            .field("matcher", &self.matcher.as_ref().map(Regex::as_str))
            .finish()
    }
}

/// Compile a route pattern, failing with the route name on error.
pub(crate) fn compile_pattern(route: &Route) -> Result<Option<Regex>, RouteError> {
    if route.pattern.is_empty() {
        return Ok(None);
    }

    Regex::new(&route.pattern)
        .map(Some)
        .map_err(|source| RouteError::InvalidPattern {
            name: route.name.clone(),
            source,
        })
}

/// Routes of one category keyed by name.
///
/// The priority order is computed on first lookup and cached until the
/// next registration.
pub struct RouteTable<E> {
    routes: HashMap<String, Arc<CompiledRoute<E>>>,
    sorted: OnceLock<Vec<Arc<CompiledRoute<E>>>>,
}

impl<E> RouteTable<E> {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            sorted: OnceLock::new(),
        }
    }

    /// Insert or replace a route by name.
    pub fn insert(&mut self, def: EventRoute<E>) -> Result<(), RouteError> {
        if def.route.name.is_empty() {
            return Err(RouteError::MissingName);
        }

        let compiled = Arc::new(CompiledRoute::compile(def)?);
        let name = compiled.name().to_string();
        if self.routes.insert(name.clone(), compiled).is_some() {
            debug!(route = %name, "Replaced existing route");
        }
        self.sorted = OnceLock::new();
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CompiledRoute<E>>> {
        self.routes.get(name)
    }

    /// Routes by priority descending, ties broken by name ascending.
    pub fn sorted(&self) -> &[Arc<CompiledRoute<E>>] {
        self.sorted.get_or_init(|| {
            let mut routes: Vec<_> = self.routes.values().cloned().collect();
            routes.sort_by(|a, b| {
                b.priority()
                    .cmp(&a.priority())
                    .then_with(|| a.name().cmp(b.name()))
            });
            routes
        })
    }

    /// First route in priority order whose pattern matches `text`.
    pub fn select(&self, text: &str) -> Option<&Arc<CompiledRoute<E>>> {
        self.sorted().iter().find(|route| route.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<E> Default for RouteTable<E> {
    fn default() -> Self {
        Self::new()
    }
}
