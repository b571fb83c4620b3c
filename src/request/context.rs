use std::net::{IpAddr, Ipv4Addr};

use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::incoming::IncomingRequest;
use super::multimap::MultiMap;
use super::sanitize::sanitize;
use crate::app::App;
use crate::error::NasseError;
use crate::ids::RequestId;
use crate::models::{Endpoint, UserSent, UserSentKind};
use crate::router::Captures;

/// Per-request state handed to handlers.
///
/// Borrows the application and the matched endpoint; owns the validated
/// input maps.
#[derive(Debug)]
pub struct RequestContext<'a> {
    app: &'a App,
    endpoint: &'a Endpoint,
    id: RequestId,
    method: Method,
    path: String,
    ip: Option<IpAddr>,
    host: Option<String>,
    args: MultiMap,
    form: MultiMap,
    values: MultiMap,
    headers: MultiMap,
    cookies: MultiMap,
    dynamics: MultiMap,
    body: &'a [u8],
}

/// `X-Forwarded-For` first entry when it is a dotted IPv4, else the peer.
pub(crate) fn client_ip(request: &IncomingRequest) -> Option<IpAddr> {
    request
        .get_header("x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .and_then(|first| first.trim().parse::<Ipv4Addr>().ok())
        .map(IpAddr::V4)
        .or(request.peer)
}

impl<'a> RequestContext<'a> {
    /// Snapshot the request. Strings are sanitized when the application asks
    /// for it. Nothing is validated yet, see [`RequestContext::validate`].
    pub fn new(
        app: &'a App,
        endpoint: &'a Endpoint,
        request: &'a IncomingRequest,
        captures: Captures,
        id: RequestId,
    ) -> Self {
        let mut args = MultiMap::from_pairs(request.query_pairs());
        let mut form = MultiMap::from_pairs(request.form_pairs());
        let mut headers = MultiMap::case_insensitive();
        headers.extend(
            request
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone())),
        );
        let mut cookies = MultiMap::from_pairs(request.cookies());
        let mut dynamics = MultiMap::from_pairs(captures);

        if app.config().sanitize {
            for map in [&mut args, &mut form, &mut headers, &mut cookies, &mut dynamics] {
                map.map_strings(sanitize);
            }
        }
        let values = args.shadowed_by(&form);

        Self {
            app,
            endpoint,
            id,
            method: request.method.clone(),
            path: request.path.clone(),
            ip: client_ip(request),
            host: request.get_header("host").map(str::to_string),
            args,
            form,
            values,
            headers,
            cookies,
            dynamics,
            body: &request.body,
        }
    }

    /// Enforce the endpoint's declared headers, parameters, cookies and
    /// dynamics, coercing the stored values of those that declare a type.
    pub fn validate(&mut self) -> Result<(), NasseError> {
        let method = self.method.as_str().to_string();
        let endpoint = self.endpoint;

        for header in &endpoint.headers {
            check(header, &method, &mut [&mut self.headers])?;
        }
        for param in &endpoint.params {
            check(
                param,
                &method,
                &mut [&mut self.values, &mut self.args, &mut self.form],
            )?;
        }
        for cookie in &endpoint.cookies {
            check(cookie, &method, &mut [&mut self.cookies])?;
        }
        for dynamic in &endpoint.dynamics {
            check(dynamic, &method, &mut [&mut self.dynamics])?;
        }
        debug!(
            request_id = %self.id,
            endpoint = %endpoint.name,
            values = self.values.len(),
            "Request validated"
        );
        Ok(())
    }

    #[must_use]
    pub fn app(&self) -> &'a App {
        self.app
    }

    #[must_use]
    pub fn endpoint(&self) -> &'a Endpoint {
        self.endpoint
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    /// `Host` header as sent by the client.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Query and form values; form wins on conflict.
    #[must_use]
    pub fn values(&self) -> &MultiMap {
        &self.values
    }

    /// Alias of [`RequestContext::values`].
    #[must_use]
    pub fn params(&self) -> &MultiMap {
        &self.values
    }

    /// Query values only.
    #[must_use]
    pub fn args(&self) -> &MultiMap {
        &self.args
    }

    /// Body values only.
    #[must_use]
    pub fn form(&self) -> &MultiMap {
        &self.form
    }

    #[must_use]
    pub fn headers(&self) -> &MultiMap {
        &self.headers
    }

    #[must_use]
    pub fn cookies(&self) -> &MultiMap {
        &self.cookies
    }

    #[must_use]
    pub fn dynamics(&self) -> &MultiMap {
        &self.dynamics
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.body
    }

    /// First value named `name`, looking at dynamics then values.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.dynamics.get(name).or_else(|| self.values.get(name))
    }

    /// Deserialize the first value named `name`.
    pub fn value<T: DeserializeOwned>(&self, name: &str) -> Result<T, NasseError> {
        let raw = self
            .get(name)
            .ok_or_else(|| NasseError::missing(crate::error::MissingKind::Value, name))?;
        serde_json::from_value(raw.clone()).map_err(|e| NasseError::Validation {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Presence and coercion of one declared value. The first map is the one
/// checked for presence; coerced values are written back to every map that
/// holds the key.
fn check<K: UserSentKind>(
    declared: &UserSent<K>,
    method: &str,
    maps: &mut [&mut MultiMap],
) -> Result<(), NasseError> {
    let present = maps
        .first()
        .is_some_and(|map| !map.get_all(&declared.name).is_empty());
    if !present {
        if declared.required && declared.applies_to(method) {
            return Err(declared.missing_error());
        }
        return Ok(());
    }
    if declared.coercion.is_none() {
        return Ok(());
    }
    for map in maps.iter_mut() {
        if map.contains_key(&declared.name) {
            let coerced = declared.coerce_all(map.get_all(&declared.name))?;
            map.set(declared.name.clone(), coerced);
        }
    }
    Ok(())
}
