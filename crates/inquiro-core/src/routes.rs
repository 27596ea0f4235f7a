//! Top-level views and the guard that decides which one may render.

/// A top-level view, addressed by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Register,
    Dashboard,
}

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Requires a stored credential.
    Protected,
    /// Only reachable while logged out.
    PublicOnly,
    /// Never renders; resolves straight to a concrete view.
    Entry,
}

/// Result of evaluating a route against the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(Route),
}

impl Resolution {
    /// The route that ends up on screen.
    pub fn target(self) -> Route {
        match self {
            Resolution::Render(route) | Resolution::Redirect(route) => route,
        }
    }
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim().trim_end_matches('/');
        match trimmed {
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/dashboard" => Route::Dashboard,
            _ => Route::Root,
        }
    }

    pub fn to_path(self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
        }
    }

    pub fn guard(self) -> Guard {
        match self {
            Route::Root => Guard::Entry,
            Route::Login | Route::Register => Guard::PublicOnly,
            Route::Dashboard => Guard::Protected,
        }
    }
}

/// Pure guard evaluation. Deterministic in `authenticated`.
pub fn resolve(route: Route, authenticated: bool) -> Resolution {
    match (route.guard(), authenticated) {
        (Guard::Entry, true) => Resolution::Redirect(Route::Dashboard),
        (Guard::Entry, false) => Resolution::Redirect(Route::Login),
        (Guard::Protected, false) => Resolution::Redirect(Route::Login),
        (Guard::PublicOnly, true) => Resolution::Redirect(Route::Dashboard),
        _ => Resolution::Render(route),
    }
}

/// History of visited views. Every entry that lands in the history has
/// already passed the guard.
#[derive(Debug, Clone)]
pub struct Navigator {
    history: Vec<Route>,
}

impl Navigator {
    /// Start at `initial`, resolved against the current session.
    pub fn new(initial: Route, authenticated: bool) -> Self {
        Self {
            history: vec![resolve(initial, authenticated).target()],
        }
    }

    pub fn current(&self) -> Route {
        self.history.last().copied().unwrap_or(Route::Root)
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Push a new entry.
    pub fn navigate(&mut self, route: Route, authenticated: bool) -> Resolution {
        let resolution = resolve(route, authenticated);
        let target = resolution.target();
        if self.history.last() != Some(&target) {
            self.history.push(target);
        }
        resolution
    }

    /// Swap the current entry so that going back cannot return to it.
    pub fn replace(&mut self, route: Route, authenticated: bool) -> Resolution {
        let resolution = resolve(route, authenticated);
        self.history.pop();
        self.history.push(resolution.target());
        resolution
    }

    /// Go back one entry. The previous entry is re-evaluated, so going back
    /// to the dashboard after a logout lands on the login view.
    pub fn back(&mut self, authenticated: bool) -> Resolution {
        if self.history.len() > 1 {
            self.history.pop();
        }
        let previous = self.current();
        self.replace(previous, authenticated)
    }

    /// Re-check the current entry after the session changed under it.
    pub fn revalidate(&mut self, authenticated: bool) -> Resolution {
        self.replace(self.current(), authenticated)
    }
}
