//! OpenGL-related structures: what a context is requested with, what it
//! turned out to be, and the state machine that binds contexts to threads.

use std::convert::TryFrom;
use crate::error::{self, Error, Result};

mod context;
mod introspect;

pub use self::context::{Context, ContextHandle, ContextState};
pub(crate) use self::context::{make_current, unbind_everywhere, swap_buffers, set_swap_interval, current_extension_supported, current_proc_address};
pub(crate) use self::introspect::{refresh_attribs, string_in_extension_string, consts};
pub(crate) use self::introspect::{GetIntegervFn, GetStringFn, GetStringiFn, ClearFn};
pub use self::introspect::parse_version;

macro_rules! raw_enum {
    ($(#[$m:meta])* pub enum $Name:ident ($what:literal) { $($(#[$vm:meta])* $Variant:ident = $raw:literal,)+ }) => {
        $(#[$m])*
        #[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
        pub enum $Name {
            $($(#[$vm])* $Variant,)+
        }
        impl $Name {
            /// The raw integer value of this variant.
            pub fn to_raw(self) -> i32 {
                match self {
                    $($Name::$Variant => $raw,)+
                }
            }
        }
        impl TryFrom<i32> for $Name {
            type Error = Error;
            fn try_from(raw: i32) -> Result<Self> {
                match raw {
                    $($raw => Ok($Name::$Variant),)+
                    _ => error::invalid_enum(format!("Invalid {} 0x{:08X}", $what, raw)),
                }
            }
        }
    };
}

raw_enum!{
    /// Which rendering API a window's context exposes, if any.
    pub enum ClientApi ("client API") {
        /// The window has no context at all.
        NoApi = 0,
        #[allow(missing_docs)]
        OpenGl = 0x0003_0001,
        #[allow(missing_docs)]
        OpenGlEs = 0x0003_0002,
    }
}

raw_enum!{
    /// Which native API creates the context.
    pub enum ContextCreationApi ("context creation API") {
        /// WGL on Windows, GLX on X11, and so on.
        Native = 0x0003_6001,
        #[allow(missing_docs)]
        Egl = 0x0003_6002,
        #[allow(missing_docs)]
        OsMesa = 0x0003_6003,
    }
}

raw_enum!{
    /// Since OpenGL 3.2, the profile for an OpenGL context is either "core"
    /// or "compatibility".
    ///
    /// See [the relevant entry of the OpenGL wiki](https://www.khronos.org/opengl/wiki/Core_And_Compatibility_in_Contexts)
    pub enum Profile ("OpenGL profile") {
        /// Let the driver decide.
        Any = 0,
        #[allow(missing_docs)]
        Core = 0x0003_2001,
        #[allow(missing_docs)]
        Compat = 0x0003_2002,
    }
}

raw_enum!{
    /// How a context reacts to a GPU reset.
    pub enum Robustness ("context robustness mode") {
        /// No robust access.
        None = 0,
        #[allow(missing_docs)]
        NoResetNotification = 0x0003_1001,
        #[allow(missing_docs)]
        LoseContextOnReset = 0x0003_1002,
    }
}

raw_enum!{
    /// What happens to pending commands when a context stops being current.
    pub enum ReleaseBehavior ("context release behavior") {
        /// Let the driver decide.
        Any = 0,
        #[allow(missing_docs)]
        Flush = 0x0003_5001,
        #[allow(missing_docs)]
        None = 0x0003_5002,
    }
}

/// Settings requested for a window's context.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct ContextConfig {
    #[allow(missing_docs)]
    pub client: ClientApi,
    #[allow(missing_docs)]
    pub source: ContextCreationApi,
    /// Minimum major version. Drivers may give a higher one.
    pub major: i32,
    /// Minimum minor version.
    pub minor: i32,
    /// Only meaningful for OpenGL 3.0 or greater.
    pub forward: bool,
    /// Do we want a debug context ?
    pub debug: bool,
    /// Errors become undefined behaviour instead of being reported.
    pub no_error: bool,
    /// Only meaningful for OpenGL 3.2 or greater.
    pub profile: Profile,
    #[allow(missing_docs)]
    pub robustness: Robustness,
    #[allow(missing_docs)]
    pub release: ReleaseBehavior,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            client: ClientApi::OpenGl,
            source: ContextCreationApi::Native,
            major: 1,
            minor: 0,
            forward: false,
            debug: false,
            no_error: false,
            profile: Profile::Any,
            robustness: Robustness::None,
            release: ReleaseBehavior::Any,
        }
    }
}

impl ContextConfig {
    /// Checks that the configuration makes sense, without asking the
    /// platform anything. `share` describes the context of the window to
    /// share objects with, if any.
    pub fn validate(&self, share: Option<&ContextAttribs>) -> Result<()> {
        if let Some(share) = share {
            if self.client == ClientApi::NoApi || share.client == ClientApi::NoApi {
                return Err(Error::no_window_context());
            }
            if self.source != share.source {
                return error::invalid_enum("Context creation APIs do not match between contexts");
            }
            if self.client != share.client {
                return error::invalid_value("Client APIs do not match between contexts");
            }
        }

        let (major, minor) = (self.major, self.minor);
        match self.client {
            ClientApi::NoApi => (),
            ClientApi::OpenGl => {
                if major < 1 || minor < 0
                || (major == 1 && minor > 5)
                || (major == 2 && minor > 1)
                || (major == 3 && minor > 3)
                {
                    // Last minor versions: 1.5, 2.1, 3.3. Anything from 4.0 on is accepted.
                    return error::invalid_value(format!("Invalid OpenGL version {}.{}", major, minor));
                }
                if self.profile != Profile::Any && crate::version_cmp::lt((major, minor), (3, 2)) {
                    return error::invalid_value("Context profiles are only defined for OpenGL version 3.2 and above");
                }
                if self.forward && major <= 2 {
                    return error::invalid_value("Forward-compatibility is only defined for OpenGL version 3.0 and above");
                }
            },
            ClientApi::OpenGlEs => {
                if major < 1 || minor < 0
                || (major == 1 && minor > 1)
                || (major == 2 && minor > 0)
                {
                    // Valid: 1.0, 1.1, 2.0 and anything from 3.0 on.
                    return error::invalid_value(format!("Invalid OpenGL ES version {}.{}", major, minor));
                }
            },
        }
        Ok(())
    }
}

/// What a context actually turned out to be, as reported by the driver.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct ContextAttribs {
    #[allow(missing_docs)]
    pub client: ClientApi,
    #[allow(missing_docs)]
    pub source: ContextCreationApi,
    #[allow(missing_docs)]
    pub major: i32,
    #[allow(missing_docs)]
    pub minor: i32,
    #[allow(missing_docs)]
    pub revision: i32,
    #[allow(missing_docs)]
    pub forward: bool,
    #[allow(missing_docs)]
    pub debug: bool,
    #[allow(missing_docs)]
    pub no_error: bool,
    #[allow(missing_docs)]
    pub profile: Profile,
    #[allow(missing_docs)]
    pub robustness: Robustness,
    #[allow(missing_docs)]
    pub release: ReleaseBehavior,
}

impl ContextAttribs {
    /// Attributes known before asking the driver anything.
    pub(crate) fn requested(config: &ContextConfig) -> Self {
        Self {
            client: config.client,
            source: config.source,
            major: 0,
            minor: 0,
            revision: 0,
            forward: false,
            debug: false,
            no_error: config.no_error,
            profile: Profile::Any,
            robustness: Robustness::None,
            release: ReleaseBehavior::Any,
        }
    }
}
