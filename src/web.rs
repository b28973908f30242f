//! The hub's web pages, as a static route table over request-scoped state.
//!
//! No server lives here: whatever accepts connections builds a [`Request`] and hands it to
//! [`dispatch`] along with the [`HubContext`].
//!
//! # Examples
//!
//! ```
//! use picolights::web::{self, Method, Request};
//! use picolights::HubContext;
//! use picolights_testing::RecordingDelay;
//!
//! let mut delay = RecordingDelay::new();
//! let mut context = HubContext::new(None, &mut delay);
//!
//! let request = Request { method: Method::Get, path: "/test", body: "" };
//! assert_eq!(Some("Hello World!".to_owned()), web::dispatch(&mut context, &request));
//!
//! let request = Request { method: Method::Post, path: "/test", body: "" };
//! assert_eq!(None, web::dispatch(&mut context, &request));
//! ```

use std::fmt::{self, Debug, Formatter};
use std::num::IntErrorKind;

use log::{info, warn};

use crate::hub::HubContext;

/// Red value that triggers the demo sequence when posted.
pub const DEMO_TRIGGER: u8 = 255;

/// HTTP request method.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,

    /// `POST`
    Post,
}

/// The parts of an HTTP request the pages look at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Request<'a> {
    /// Request method.
    pub method: Method,

    /// Request path, without query string.
    pub path: &'a str,

    /// Request body; `application/x-www-form-urlencoded` for posted forms.
    pub body: &'a str,
}

/// Renders a page for a request.
pub type Handler = fn(&mut HubContext<'_>, &Request<'_>) -> String;

/// A page: the path it lives at, the methods it accepts, and the function that renders it.
#[derive(Copy, Clone)]
pub struct Route {
    /// Path the page lives at.
    pub path: &'static str,

    /// Methods the page accepts.
    pub methods: &'static [Method],

    /// Renders the page.
    pub handler: Handler,
}

impl Debug for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// Every page the hub serves.
pub static ROUTES: &[Route] = &[
    Route {
        path: "/",
        methods: &[Method::Get, Method::Post],
        handler: home,
    },
    Route {
        path: "/test",
        methods: &[Method::Get],
        handler: test,
    },
];

/// Renders the page for `request`, or returns `None` if no route accepts it.
pub fn dispatch(context: &mut HubContext<'_>, request: &Request<'_>) -> Option<String> {
    ROUTES
        .iter()
        .find(|route| route.path == request.path && route.methods.contains(&request.method))
        .map(|route| (route.handler)(context, request))
}

/// The red, green and blue values of the light form.
///
/// Parsed from each request rather than kept between requests, so a `GET` always shows zeros.
///
/// # Examples
///
/// ```
/// use picolights::web::LightForm;
///
/// let form = LightForm::parse("r=255&g=-4&b=900");
/// assert_eq!(LightForm { r: 255, g: 0, b: 255 }, form);
/// assert!(form.render().contains(r#"name="g" type="number" value="0""#));
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct LightForm {
    /// Red.
    pub r: u8,

    /// Green.
    pub g: u8,

    /// Blue.
    pub b: u8,
}

impl LightForm {
    /// Parses a form body. Missing or non-numeric fields are 0; others are clamped to 0–255.
    pub fn parse(body: &str) -> Self {
        let mut form = LightForm::default();
        for (key, value) in form_urlencoded::parse(body.as_bytes()) {
            let channel = match &*key {
                "r" => &mut form.r,
                "g" => &mut form.g,
                "b" => &mut form.b,
                _ => continue,
            };
            *channel = clamp_channel(&value);
        }
        form
    }

    /// Renders the form as HTML, pre-filled with these values.
    pub fn render(&self) -> String {
        format!(
            r#"<form method="post" action="/">
    <input id="r" name="r" type="number" value="{}" />
    <input name="g" type="number" value="{}"  />
    <input name="b" type="number" value="{}"  />
    <input type="submit" value="Set LED" />
</form>"#,
            self.r, self.g, self.b
        )
    }
}

fn clamp_channel(value: &str) -> u8 {
    match value.trim().parse::<i64>() {
        Ok(value) => u8::try_from(value.clamp(0, i64::from(u8::MAX))).unwrap_or(0),
        Err(error) if *error.kind() == IntErrorKind::PosOverflow => u8::MAX,
        Err(_) => 0,
    }
}

fn home(context: &mut HubContext<'_>, request: &Request<'_>) -> String {
    let form = match request.method {
        Method::Post => LightForm::parse(request.body),
        Method::Get => LightForm::default(),
    };

    if form.r == DEMO_TRIGGER {
        match &context.lights {
            Some(lights) => {
                info!("Doing a demo");
                if let Err(error) = lights.run_demo_sequence(&mut *context.delay) {
                    warn!("Demo failed: {}", error);
                }
            }
            None => warn!("Demo requested but the lights module is disabled"),
        }
    }

    form.render()
}

fn test(_context: &mut HubContext<'_>, _request: &Request<'_>) -> String {
    "Hello World!".to_owned()
}
