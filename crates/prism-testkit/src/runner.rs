use prism_core::{BindingError, BoxedTransformer, Encoding, Event, Message, Transformers};
use tracing::debug;

use crate::mock::{MockBinaryMessage, mock_structured_message};

/// One row of a table-driven transformer test.
#[derive(Debug)]
pub struct TransformerTestArgs {
    /// Case name, shown in failure messages.
    pub name: &'static str,
    /// The event fed into the transformers.
    pub input: Event,
    /// Transformers applied in order.
    pub transformers: Vec<BoxedTransformer>,
    /// The expected result when the case succeeds.
    pub want_event: Option<Event>,
    /// The expected error when the case fails.
    ///
    /// On the binary path the error surfaces when the message is read and
    /// may be wrapped in [`BindingError::WriteError`].
    pub want_error: Option<BindingError>,
}

/// Runs every case against an event, a structured and a binary message.
///
/// # Panics
///
/// Panics with the case name and representation on the first mismatch.
pub fn run_transformer_tests(cases: Vec<TransformerTestArgs>) {
    for case in cases {
        let transformers = Transformers::from(case.transformers.clone());
        let messages = [
            Message::from(case.input.clone()),
            mock_structured_message(&case.input),
            MockBinaryMessage::new(case.input.clone()).into_message(),
        ];

        for message in messages {
            let encoding = message.encoding();
            debug!(case = case.name, %encoding, "Running transformer case");

            let result = transformers
                .apply(message)
                .and_then(Message::into_event);
            check_case(&case, encoding, result);
        }
    }
}

fn check_case(case: &TransformerTestArgs, encoding: Encoding, result: Result<Event, BindingError>) {
    match (result, &case.want_event, &case.want_error) {
        (Ok(got), Some(want), _) => assert_event_equals(want, &got),
        (Ok(got), None, Some(want)) => panic!(
            "[{}/{encoding}] expected error {want}, got event {got:?}",
            case.name
        ),
        (Ok(_), None, None) => {}
        (Err(got), _, Some(want)) => assert!(
            error_matches(&got, want),
            "[{}/{encoding}] expected error {want}, got {got}",
            case.name
        ),
        (Err(got), _, None) => panic!("[{}/{encoding}] unexpected error: {got}", case.name),
    }
}

fn error_matches(got: &BindingError, want: &BindingError) -> bool {
    got == want || matches!(got, BindingError::WriteError { source, .. } if **source == *want)
}

/// Asserts that two events are equal, reporting the first differing part.
///
/// # Panics
///
/// Panics when the events differ.
pub fn assert_event_equals(want: &Event, got: &Event) {
    assert_eq!(want.spec_version(), got.spec_version(), "spec version differs");

    let want_attributes: Vec<_> = want.attributes().collect();
    let got_attributes: Vec<_> = got.attributes().collect();
    assert_eq!(want_attributes, got_attributes, "attributes differ");

    let want_extensions: Vec<_> = want.extensions().collect();
    let got_extensions: Vec<_> = got.extensions().collect();
    assert_eq!(want_extensions, got_extensions, "extensions differ");

    assert_eq!(want.data(), got.data(), "payload differs");
}
