//! Routing and dispatch engine for the gadget bot.
//!
//! Feature modules register routes in a [`Registry`]; the [`Dispatcher`]
//! verifies and decodes each webhook request, selects one route by
//! priority and pattern, checks the actor's groups, and runs the handler
//! on an isolated task.

mod collaborator;
mod dispatcher;
mod error;
mod event;
mod identity;
mod matcher;
mod permission;
mod registry;
mod route;
mod runner;

pub use collaborator::{EventDecoder, SignatureVerifier};
pub use dispatcher::{Dispatch, Dispatcher, Outcome, UNKNOWN_COMMAND_TEXT};
pub use error::{BoxError, DispatchError, IdentityError, RouteError};
pub use event::{CallbackEvent, ChannelMessageEvent, CommandInvocation, InboundEvent, MentionEvent};
pub use identity::BotIdentity;
pub use matcher::{CompiledRoute, RouteTable};
pub use permission::{is_permitted, PermissionEvaluator};
pub use registry::{CompiledCommand, RegisteredRoute, Registry};
pub use route::{
    handler_fn, Category, ChannelMessageRoute, CommandRoute, EventRoute, Handler, HandlerFn,
    MentionRoute, Request, Route, WILDCARD,
};
pub use runner::{TaskContext, TaskOutcome, TaskRunner};
