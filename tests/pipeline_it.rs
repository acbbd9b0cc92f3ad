mod common;

// std
use std::time::Duration as StdDuration;
// crates.io
use time::Duration;
// self
use common::{ScriptedTransport, Step, scripted_client};
use ls_api_client::{
	error::{AuthError, Error},
	http::{ApiResponse, Method, RequestBody},
	rate_limit::{BUCKET_LEVEL_HEADER, DRIP_RATE_HEADER},
};

#[tokio::test(start_paused = true)]
async fn get_waits_for_an_empty_bucket_to_drip() {
	let transport = ScriptedTransport::new([Step::status(200)]);
	let client = scripted_client(&transport);

	// available = 0, drip = 1, last request just now.
	client.rate_limiter.observe(
		&ApiResponse::new(200)
			.with_header(BUCKET_LEVEL_HEADER, "60/60")
			.with_header(DRIP_RATE_HEADER, "1"),
	);

	let started = tokio::time::Instant::now();
	let response = client.get("Item.json").await.expect("GET should succeed.");
	let sent_at = transport.api_send_times()[0];
	let waited = sent_at - started;

	assert_eq!(response.status, 200);
	assert!(waited >= StdDuration::from_secs(1), "Expected ~1s throttle, waited {waited:?}.");
	assert!(waited < StdDuration::from_millis(1_100), "Expected ~1s throttle, waited {waited:?}.");
}

#[tokio::test(start_paused = true)]
async fn drip_time_passed_on_the_runtime_clock_skips_the_wait() {
	let transport = ScriptedTransport::new([Step::status(200)]);
	let client = scripted_client(&transport);

	client.rate_limiter.observe(
		&ApiResponse::new(200)
			.with_header(BUCKET_LEVEL_HEADER, "60/60")
			.with_header(DRIP_RATE_HEADER, "1"),
	);
	tokio::time::advance(StdDuration::from_secs(5)).await;

	let started = tokio::time::Instant::now();

	client.get("Item.json").await.expect("GET should succeed.");

	assert_eq!(transport.api_send_times()[0] - started, StdDuration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn get_with_budget_is_sent_at_once() {
	let transport = ScriptedTransport::new([Step::status(200)]);
	let client = scripted_client(&transport);

	client.rate_limiter.observe(
		&ApiResponse::new(200)
			.with_header(BUCKET_LEVEL_HEADER, "3/60")
			.with_header(DRIP_RATE_HEADER, "2"),
	);

	let started = tokio::time::Instant::now();

	client.get("Item.json").await.expect("GET should succeed.");

	assert_eq!(transport.api_send_times()[0] - started, StdDuration::ZERO);
}

#[tokio::test]
async fn post_refreshes_twice_on_repeated_unauthorized() {
	let transport =
		ScriptedTransport::new([Step::status(401), Step::status(401), Step::status(200)]);
	let client = scripted_client(&transport);
	let response = client
		.post("Sale.json", RequestBody::json(r#"{"shopID":1}"#))
		.await
		.expect("POST should eventually succeed.");

	assert_eq!(response.status, 200);
	assert_eq!(transport.api_calls(), 3);
	assert_eq!(transport.auth_calls(), 2);
	assert_eq!(
		transport.authorization_headers(),
		vec!["Bearer ".to_owned(), "Bearer token-1".to_owned(), "Bearer token-2".to_owned()]
	);
	assert_eq!(client.tokens.current_token().expose(), "token-2");

	for request in transport.api_requests() {
		assert_eq!(request.method, Method::Post);
		assert_eq!(request.body, RequestBody::json(r#"{"shopID":1}"#));
		assert_eq!(request.header("accept"), Some("application/json"));
		assert_eq!(request.url.path(), "/API/Account/12345/Sale.json");
	}
}

#[tokio::test]
async fn third_unauthorized_is_returned_to_the_caller() {
	let transport = ScriptedTransport::new([Step::status(401)]);
	let client = scripted_client(&transport);
	let response = client.get("Item.json").await.expect("A 401 response is not a client error.");

	assert_eq!(response.status, 401);
	assert_eq!(transport.api_calls(), 3);
	assert_eq!(transport.auth_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn persistent_unavailability_stops_at_the_ceiling() {
	let transport = ScriptedTransport::new([Step::Respond(
		ApiResponse::new(503).with_body(r#"{"message":"Service Unavailable"}"#),
	)]);
	let client = scripted_client(&transport);
	let started = tokio::time::Instant::now();
	let response =
		client.get("Item.json").await.expect("The final 503 is returned, not an error.");

	assert_eq!(response.status, 503);
	assert_eq!(response.body, br#"{"message":"Service Unavailable"}"#.to_vec());
	// Initial attempt plus five retries.
	assert_eq!(transport.api_calls(), 6);

	let times = transport.api_send_times();
	let gaps = times.windows(2).map(|pair| pair[1] - pair[0]).collect::<Vec<_>>();

	assert_eq!(
		gaps,
		(0..5).map(StdDuration::from_secs).collect::<Vec<_>>(),
		"Linear backoff must be 0, 1, 2, 3, 4 seconds."
	);
	assert!(tokio::time::Instant::now() - started >= StdDuration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn transport_failures_exhaust_into_an_error() {
	let transport = ScriptedTransport::new([Step::Fail]);
	let client = scripted_client(&transport);
	let err = client.delete("Item/7.json").await.expect_err("Transport failures must surface.");

	assert!(
		matches!(err, Error::RetriesExhausted { attempts: 6, .. }),
		"Unexpected error: {err:?}."
	);
	assert_eq!(transport.api_calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn transient_failure_recovers() {
	let transport = ScriptedTransport::new([
		Step::Fail,
		Step::status(502),
		Step::status(429),
		Step::status(200),
	]);
	let client = scripted_client(&transport);
	let response = client.get("Item.json").await.expect("Pipeline should recover.");

	assert_eq!(response.status, 200);
	assert_eq!(transport.api_calls(), 4);
	assert_eq!(transport.auth_calls(), 0);
}

#[tokio::test]
async fn failed_refresh_short_circuits_the_loop() {
	let transport = ScriptedTransport::new([Step::status(401)]).with_auth_replies([
		ApiResponse::new(400).with_body(r#"{"error":"invalid_grant"}"#),
	]);
	let client = scripted_client(&transport);
	let err = client.get("Item.json").await.expect_err("Refresh failures must surface.");

	assert!(
		matches!(err, Error::Auth(AuthError::Rejected { status: 400, .. })),
		"Unexpected error: {err:?}."
	);
	assert_eq!(transport.api_calls(), 1);
	assert_eq!(transport.auth_calls(), 1);
	assert_eq!(client.tokens.current_token().expose(), "");
}

#[tokio::test]
async fn terminal_statuses_are_not_retried() {
	let transport = ScriptedTransport::new([Step::Respond(
		ApiResponse::new(404).with_body(r#"{"message":"Item not found"}"#),
	)]);
	let client = scripted_client(&transport);
	let response =
		client.put("Item/9.json", RequestBody::json("{}")).await.expect("404 is a response.");

	assert_eq!(response.status, 404);
	assert_eq!(response.body, br#"{"message":"Item not found"}"#.to_vec());
	assert_eq!(transport.api_calls(), 1);
}

#[tokio::test]
async fn every_response_updates_the_bucket() {
	let transport = ScriptedTransport::new([
		Step::Respond(
			ApiResponse::new(429)
				.with_header(BUCKET_LEVEL_HEADER, "59/60")
				.with_header(DRIP_RATE_HEADER, "1"),
		),
		Step::Respond(
			ApiResponse::new(200)
				.with_header(BUCKET_LEVEL_HEADER, "12/60")
				.with_header(DRIP_RATE_HEADER, "2"),
		),
	]);
	let client = scripted_client(&transport);
	let response = client.get("Item.json").await.expect("Throttled GET should recover.");
	let bucket = client.rate_limiter.snapshot();

	assert_eq!(response.status, 200);
	assert_eq!(bucket.available(), 48.);
	assert_eq!(bucket.drip, 2.);
	assert_eq!(client.rate_limiter.wait_duration(10), Duration::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn clones_share_state_across_tasks() {
	let transport = ScriptedTransport::new([Step::status(401), Step::status(200)]);
	let client = scripted_client(&transport);
	let first = client.clone();
	let second = client.clone();
	let (a, b) = tokio::join!(
		tokio::spawn(async move { first.get("Item.json").await.map(|r| r.status) }),
		tokio::spawn(async move { second.get("Customer.json").await.map(|r| r.status) }),
	);

	assert_eq!(a.expect("Task should not panic.").expect("GET should succeed."), 200);
	assert_eq!(b.expect("Task should not panic.").expect("GET should succeed."), 200);
	assert!(!client.tokens.current_token().is_empty(), "Clones must share the refreshed token.");
}
