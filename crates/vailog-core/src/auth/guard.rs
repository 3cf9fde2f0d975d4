//! Navigation guards.
//!
//! Each screen belongs to a route group guarded by either [`RouteGuard::RequireAuth`]
//! or [`RouteGuard::PublicOnly`]. The decision is made synchronously from the
//! local session; tokens rejected by the backend are dropped by the API client
//! (see `ApiClient::request`), after which the next check redirects to login.

use super::SessionStore;

/// Screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Home,
    ProfileEdit,
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Entrar",
            Route::Register => "Criar conta",
            Route::Home => "Assistente de Decisões",
            Route::ProfileEdit => "Editar Perfil",
        }
    }

    /// Guard protecting this route's group.
    pub fn guard(&self) -> RouteGuard {
        match self {
            Route::Login | Route::Register => RouteGuard::PublicOnly,
            Route::Home | Route::ProfileEdit => RouteGuard::RequireAuth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    /// Only reachable with a session; otherwise go to login.
    RequireAuth,
    /// Only reachable without a session (login, register); otherwise go home.
    PublicOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect {
        to: Route,
        /// Originally requested route, kept so login can return to it.
        from: Option<Route>,
    },
}

impl RouteGuard {
    pub fn check(&self, session: &SessionStore, requested: Route) -> Decision {
        let authenticated = session.is_authenticated();
        match self {
            RouteGuard::RequireAuth if !authenticated => Decision::Redirect {
                to: Route::Login,
                from: Some(requested),
            },
            RouteGuard::PublicOnly if authenticated => Decision::Redirect {
                to: Route::Home,
                from: None,
            },
            _ => Decision::Allow,
        }
    }
}

/// Run the guard of `requested` against the current session.
pub fn resolve(session: &SessionStore, requested: Route) -> Decision {
    requested.guard().check(session, requested)
}
