//! Scope-based field authorization.
//!
//! Types and fields declare required scopes under the `scope_auth` option:
//!
//! ```json
//! { "any": ["reader", "admin"], "all": ["verified"] }
//! ```
//!
//! A field's own scopes replace those of its parent type. Protected fields
//! record their effective scopes in `extensions["authScopes"]` and their
//! resolvers are wrapped with a check against [`RequestContext::scopes`].
//! A denied call fails with a field error and never reaches the inner
//! resolver. Subscription fields are checked when the stream is opened, so a
//! denied subscription never starts its event source.

use std::sync::Arc;

use async_graphql::{Error as GraphQLError, ErrorExtensions};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use trellis_core::resolver::{EventStream, ResolveResult};
use trellis_core::{
    HookContext, OutputFieldConfig, Plugin, PluginError, PluginOptions, PluginRegistry,
    RequestContext, ResolveParams, Resolver, SchemaBuilderConfig, SchemaError, Subscriber,
    TypeConfig,
};

/// Name the plugin is registered under; also its option namespace.
pub const PLUGIN_NAME: &str = "scope_auth";

/// Extension key the effective scopes are written to.
pub const EXTENSION_KEY: &str = "authScopes";

/// Error code set on denied field errors.
pub const UNAUTHORIZED_CODE: &str = "UNAUTHORIZED";

fn default_unauthorized_error() -> String {
    "Not authorized".into()
}

/// Builder-level options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeAuthOptions {
    /// Message of the field error returned on denial.
    /// Default: "Not authorized"
    #[serde(default = "default_unauthorized_error")]
    pub unauthorized_error: String,
}

impl Default for ScopeAuthOptions {
    fn default() -> Self {
        Self {
            unauthorized_error: default_unauthorized_error(),
        }
    }
}

/// Scopes required to resolve a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthScopes {
    /// At least one of these must be granted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any: Vec<String>,
    /// All of these must be granted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<String>,
}

impl AuthScopes {
    pub fn any<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            any: scopes.into_iter().map(Into::into).collect(),
            all: Vec::new(),
        }
    }

    pub fn all<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            any: Vec::new(),
            all: scopes.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.any.is_empty() && self.all.is_empty()
    }

    /// True when the request grants these scopes.
    #[must_use]
    pub fn allows(&self, context: &RequestContext) -> bool {
        (self.any.is_empty() || context.has_any_scope(self.any.as_slice()))
            && context.has_all_scopes(self.all.as_slice())
    }

    fn from_options(options: &PluginOptions) -> Result<Option<Self>, PluginError> {
        Ok(options.get::<Self>(PLUGIN_NAME)?.filter(|scopes| !scopes.is_empty()))
    }
}

/// Guards fields behind request scopes.
#[derive(Debug, Clone, Default)]
pub struct ScopeAuthPlugin {
    options: ScopeAuthOptions,
}

impl ScopeAuthPlugin {
    pub fn new(options: ScopeAuthOptions) -> Self {
        Self { options }
    }

    /// Scopes that apply to `field`: its own, else its parent type's.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::InvalidOptions` if a `scope_auth` option does
    /// not decode.
    pub fn effective_scopes(
        &self,
        field: &OutputFieldConfig,
        cx: &HookContext<'_>,
    ) -> Result<Option<AuthScopes>, PluginError> {
        if let Some(scopes) = AuthScopes::from_options(&field.options)? {
            return Ok(Some(scopes));
        }
        match cx.type_named(field.parent_type()) {
            Some(parent) => AuthScopes::from_options(&parent.options),
            None => Ok(None),
        }
    }

    fn unauthorized(&self, field: &str) -> GraphQLError {
        GraphQLError::new(self.options.unauthorized_error.as_str()).extend_with(|_, e| {
            e.set("code", UNAUTHORIZED_CODE.to_string());
            e.set("field", field.to_string());
        })
    }

    fn guard_subscriber(&self, inner: Subscriber, scopes: AuthScopes, field: String) -> Subscriber {
        let denied = self.unauthorized(&field);
        Arc::new(move |params: ResolveParams| {
            if scopes.allows(&params.context) {
                return inner(params);
            }
            debug!(
                field = %field,
                request_id = ?params.context.request_id,
                "Denied subscription"
            );
            let denied: async_graphql::Result<EventStream> = Err(denied.clone());
            Box::pin(async move { denied })
        })
    }
}

impl Plugin for ScopeAuthPlugin {
    fn on_type_config(
        &self,
        mut config: TypeConfig,
        _cx: &HookContext<'_>,
    ) -> Result<TypeConfig, PluginError> {
        if let Some(scopes) = AuthScopes::from_options(&config.options)? {
            config.extensions.insert(EXTENSION_KEY.to_string(), to_json(&scopes)?);
        }
        Ok(config)
    }

    fn on_output_field_config(
        &self,
        mut config: OutputFieldConfig,
        cx: &HookContext<'_>,
    ) -> Result<OutputFieldConfig, PluginError> {
        if let Some(scopes) = self.effective_scopes(&config, cx)? {
            trace!(field = %config.field_ref(), ?scopes, "Protected field");
            config.extensions.insert(EXTENSION_KEY.to_string(), to_json(&scopes)?);
            if let Some(subscriber) = config.subscriber.take() {
                let field = config.field_ref().to_string();
                config.subscriber = Some(self.guard_subscriber(subscriber, scopes, field));
            }
        }
        Ok(config)
    }

    fn wrap_resolve(
        &self,
        inner: Resolver,
        field: &OutputFieldConfig,
        cx: &HookContext<'_>,
    ) -> Result<Resolver, PluginError> {
        let Some(scopes) = self.effective_scopes(field, cx)? else {
            return Ok(inner);
        };

        let scopes = Arc::new(scopes);
        let field_name = field.field_ref().to_string();
        let denied = self.unauthorized(&field_name);
        Ok(Arc::new(move |params: ResolveParams| {
            if scopes.allows(&params.context) {
                return inner(params);
            }
            debug!(
                field = %field_name,
                request_id = ?params.context.request_id,
                "Denied field resolution"
            );
            let denied: ResolveResult = Err(denied.clone());
            Box::pin(async move { denied })
        }))
    }
}

fn to_json(scopes: &AuthScopes) -> Result<serde_json::Value, PluginError> {
    serde_json::to_value(scopes).map_err(|e| PluginError::hook(e.to_string()))
}

/// Registers the plugin under [`PLUGIN_NAME`].
///
/// # Errors
///
/// Returns `SchemaError::DuplicatePluginName` if the name is taken.
pub fn register(registry: &mut PluginRegistry) -> Result<(), SchemaError> {
    registry.register(PLUGIN_NAME, |config: &SchemaBuilderConfig| {
        let options = config
            .plugin_options::<ScopeAuthOptions>(PLUGIN_NAME)?
            .unwrap_or_default();
        Ok(Arc::new(ScopeAuthPlugin::new(options)) as Arc<dyn Plugin>)
    })
}
