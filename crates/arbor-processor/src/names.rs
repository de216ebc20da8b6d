//! Well-known annotation and type names.
//!
//! One flat module, mirroring how the rest of the crate refers to the CDI
//! vocabulary by fully-qualified name.

pub const OBJECT: &str = "java.lang.Object";

// jakarta.inject
pub const INJECT: &str = "jakarta.inject.Inject";
pub const QUALIFIER: &str = "jakarta.inject.Qualifier";
pub const NAMED: &str = "jakarta.inject.Named";
pub const SINGLETON: &str = "jakarta.inject.Singleton";
pub const PROVIDER: &str = "jakarta.inject.Provider";

// jakarta.enterprise.context
pub const DEPENDENT: &str = "jakarta.enterprise.context.Dependent";
pub const APPLICATION_SCOPED: &str = "jakarta.enterprise.context.ApplicationScoped";
pub const REQUEST_SCOPED: &str = "jakarta.enterprise.context.RequestScoped";
pub const SESSION_SCOPED: &str = "jakarta.enterprise.context.SessionScoped";

// jakarta.enterprise.inject
pub const PRODUCES: &str = "jakarta.enterprise.inject.Produces";
pub const DISPOSES: &str = "jakarta.enterprise.inject.Disposes";
pub const ALTERNATIVE: &str = "jakarta.enterprise.inject.Alternative";
pub const VETOED: &str = "jakarta.enterprise.inject.Vetoed";
pub const TYPED: &str = "jakarta.enterprise.inject.Typed";
pub const ANY: &str = "jakarta.enterprise.inject.Any";
pub const DEFAULT: &str = "jakarta.enterprise.inject.Default";
pub const INSTANCE: &str = "jakarta.enterprise.inject.Instance";
pub const MODEL: &str = "jakarta.enterprise.inject.Model";

// jakarta.enterprise.inject.spi
pub const EXTENSION: &str = "jakarta.enterprise.inject.spi.Extension";

// jakarta.enterprise.event
pub const OBSERVES: &str = "jakarta.enterprise.event.Observes";
pub const OBSERVES_ASYNC: &str = "jakarta.enterprise.event.ObservesAsync";
pub const EVENT: &str = "jakarta.enterprise.event.Event";

// jakarta.enterprise.util / stereotypes
pub const STEREOTYPE: &str = "jakarta.enterprise.inject.Stereotype";

// jakarta.interceptor
pub const INTERCEPTOR: &str = "jakarta.interceptor.Interceptor";
pub const INTERCEPTOR_BINDING: &str = "jakarta.interceptor.InterceptorBinding";
pub const AROUND_INVOKE: &str = "jakarta.interceptor.AroundInvoke";
pub const AROUND_CONSTRUCT: &str = "jakarta.interceptor.AroundConstruct";

// jakarta.decorator
pub const DECORATOR: &str = "jakarta.decorator.Decorator";
pub const DELEGATE: &str = "jakarta.decorator.Delegate";

// jakarta.annotation
pub const POST_CONSTRUCT: &str = "jakarta.annotation.PostConstruct";
pub const PRE_DESTROY: &str = "jakarta.annotation.PreDestroy";
pub const PRIORITY: &str = "jakarta.annotation.Priority";

// jakarta.enterprise.util
pub const NONBINDING: &str = "jakarta.enterprise.util.Nonbinding";

// Container extensions
pub const DEFAULT_BEAN: &str = "io.arbor.DefaultBean";
pub const NO_CLASS_INTERCEPTORS: &str = "jakarta.interceptor.NoClassInterceptors";
pub const TRANSIENT_REFERENCE: &str = "jakarta.enterprise.context.TransientReference";
