//! Request parameters and their validation.
//!
//! Transport bindings hand the provider the raw `name=value` pairs of a
//! request as [`Parameters`]. [`Request::parse`] checks them against the
//! argument rules of the verb, decodes the resumption token and parses the
//! date bounds, so handlers only see well-formed requests.

use chrono::{DateTime, Utc};

use crate::error::HandlerError;
use crate::model::{Granularity, ResumptionValue, Verb};
use crate::provider::resumption::ResumptionTokenFormat;

/// `verb`
pub const VERB: &str = "verb";
/// `identifier`
pub const IDENTIFIER: &str = "identifier";
/// `metadataPrefix`
pub const METADATA_PREFIX: &str = "metadataPrefix";
/// `set`
pub const SET: &str = "set";
/// `from`
pub const FROM: &str = "from";
/// `until`
pub const UNTIL: &str = "until";
/// `resumptionToken`
pub const RESUMPTION_TOKEN: &str = "resumptionToken";

/// Raw request arguments, in request order, repeats preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    pairs: Vec<(String, String)>,
}

impl Parameters {
    /// No arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Appends an argument in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// The first value given for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// How many times `name` was given.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.pairs.iter().filter(|(key, _)| key == name).count()
    }

    /// All arguments.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Parameters {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The verb.
    pub verb: Verb,
    /// `identifier`
    pub identifier: Option<String>,
    /// `metadataPrefix`
    pub metadata_prefix: Option<String>,
    /// `set`
    pub set: Option<String>,
    /// `from`, at the start of its granule.
    pub from: Option<DateTime<Utc>>,
    /// `until`, at the end of its granule.
    pub until: Option<DateTime<Utc>>,
    /// Decoded `resumptionToken`.
    pub resumption: Option<ResumptionValue>,
}

impl Request {
    /// A request for `verb` with no arguments.
    #[must_use]
    pub fn new(verb: Verb) -> Self {
        Request {
            verb,
            identifier: None,
            metadata_prefix: None,
            set: None,
            from: None,
            until: None,
            resumption: None,
        }
    }

    /// Validates raw parameters.
    ///
    /// # Arguments
    ///
    /// * `parameters` - the raw request arguments
    /// * `granularity` - the finest granularity the repository supports
    /// * `tokens` - the format used to decode `resumptionToken`
    ///
    /// # Errors
    ///
    /// - [`HandlerError::BadVerb`] if the verb is missing, repeated or unknown
    /// - [`HandlerError::BadArgument`] for illegal or repeated arguments,
    ///   a resumption token combined with other arguments, or bad dates
    /// - [`HandlerError::BadResumptionToken`] if the token does not decode
    pub fn parse(
        parameters: &Parameters,
        granularity: Granularity,
        tokens: &dyn ResumptionTokenFormat,
    ) -> Result<Self, HandlerError> {
        let verb = match parameters.count(VERB) {
            0 => return Err(HandlerError::BadVerb("the verb argument is missing".into())),
            1 => parameters.get(VERB).unwrap_or_default().parse::<Verb>()?,
            _ => return Err(HandlerError::BadVerb("the verb argument is repeated".into())),
        };

        let allowed = allowed_arguments(verb);
        for (name, _) in parameters.iter() {
            if name == VERB {
                continue;
            }
            if !allowed.contains(&name) {
                return Err(HandlerError::BadArgument(format!(
                    "illegal argument {name} for {verb}"
                )));
            }
            if parameters.count(name) > 1 {
                return Err(HandlerError::BadArgument(format!("argument {name} is repeated")));
            }
        }

        let mut request = Request::new(verb);
        if let Some(token) = parameters.get(RESUMPTION_TOKEN) {
            if parameters.iter().any(|(name, _)| name != VERB && name != RESUMPTION_TOKEN) {
                return Err(HandlerError::BadArgument(
                    "resumptionToken is an exclusive argument".into(),
                ));
            }
            request.resumption = Some(tokens.parse(token)?);
            return Ok(request);
        }

        request.identifier = parameters.get(IDENTIFIER).map(str::to_string);
        request.metadata_prefix = parameters.get(METADATA_PREFIX).map(str::to_string);
        request.set = parameters.get(SET).map(str::to_string);

        let from = parameters
            .get(FROM)
            .map(|raw| parse_bound(FROM, raw, granularity))
            .transpose()?;
        let until = parameters
            .get(UNTIL)
            .map(|raw| parse_bound(UNTIL, raw, granularity))
            .transpose()?;
        if let (Some((from_granularity, _)), Some((until_granularity, _))) = (&from, &until) {
            if from_granularity != until_granularity {
                return Err(HandlerError::BadArgument(
                    "from and until must have the same granularity".into(),
                ));
            }
        }
        request.from = from.map(|(g, date)| g.truncate(&date));
        request.until = until.map(|(g, date)| g.end_of(&date));
        if let (Some(from), Some(until)) = (request.from, request.until) {
            if from > until {
                return Err(HandlerError::BadArgument("from is later than until".into()));
            }
        }
        Ok(request)
    }

    /// Listing state for this request: the decoded token, or offset zero
    /// with the request's own selection.
    #[must_use]
    pub fn listing_state(&self) -> ResumptionValue {
        match &self.resumption {
            Some(value) => value.clone(),
            None => ResumptionValue::new()
                .with_set_spec(self.set.clone())
                .with_from(self.from)
                .with_until(self.until)
                .with_metadata_prefix(self.metadata_prefix.clone()),
        }
    }

    /// Whether the request continues an earlier listing.
    #[must_use]
    pub fn is_resumed(&self) -> bool {
        self.resumption.is_some()
    }
}

fn allowed_arguments(verb: Verb) -> &'static [&'static str] {
    match verb {
        Verb::Identify => &[],
        Verb::GetRecord => &[IDENTIFIER, METADATA_PREFIX],
        Verb::ListRecords | Verb::ListIdentifiers => {
            &[METADATA_PREFIX, SET, FROM, UNTIL, RESUMPTION_TOKEN]
        },
        Verb::ListSets => &[RESUMPTION_TOKEN],
        Verb::ListMetadataFormats => &[IDENTIFIER],
    }
}

fn parse_bound(
    name: &str,
    raw: &str,
    supported: Granularity,
) -> Result<(Granularity, DateTime<Utc>), HandlerError> {
    let granularity = Granularity::detect(raw)
        .map_err(|_| HandlerError::BadArgument(format!("{name} is not a valid datestamp: {raw}")))?;
    if granularity == Granularity::Second && supported == Granularity::Day {
        return Err(HandlerError::BadArgument(format!(
            "{name} is finer than the repository granularity {supported}"
        )));
    }
    let date = granularity
        .parse(raw)
        .map_err(|e| HandlerError::BadArgument(format!("{name}: {e}")))?;
    Ok((granularity, date))
}
