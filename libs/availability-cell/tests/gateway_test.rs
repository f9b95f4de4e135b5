// libs/availability-cell/tests/gateway_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use availability_cell::error::{AvailabilityError, SUBMISSION_FALLBACK_MESSAGE};
use availability_cell::models::{NewAppointment, PatientContact, ProfessionalAction, RescheduleContext};
use availability_cell::services::{
    AppointmentGateway, BlockedDayIndex, CalendarConstraints, GatewayError, HttpAppointmentGateway,
    OccupiedSlotResolver, SubmissionService,
};
use shared_utils::test_utils::{MockClinicResponses, TestConfig};

const PROFESSIONAL: i64 = 7;
const TOKEN: &str = "patient-session";

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn gateway_for(server: &MockServer) -> HttpAppointmentGateway {
    HttpAppointmentGateway::new(&TestConfig::with_backend(server.uri()).to_app_config(), Some(TOKEN.to_string()))
}

fn resolver_for(server: &MockServer) -> OccupiedSlotResolver {
    OccupiedSlotResolver::new(Arc::new(gateway_for(server)), CalendarConstraints::default())
}

async fn mount_available_hours(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/professionals/{}/available-hours", PROFESSIONAL)))
        .and(query_param("date", "2024-06-10"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_blocked_days_query_sends_range_and_credentials() {
    let mock_server = MockServer::start().await;
    let blocked = [NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()];

    Mock::given(method("GET"))
        .and(path(format!("/api/professionals/{}/blocked-days", PROFESSIONAL)))
        .and(query_param("from", "2024-06-03"))
        .and(query_param("to", "2024-09-01"))
        .and(header("authorization", "Bearer patient-session"))
        .and(header("apikey", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockClinicResponses::blocked_days(&blocked)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let index = BlockedDayIndex::load(
        &gateway,
        PROFESSIONAL,
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(index.len(), 1);
    assert!(index.is_blocked(blocked[0]));
    assert!(!index.is_blocked(monday()));
}

#[tokio::test]
async fn test_blocked_days_failure_is_a_query_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/professionals/{}/blocked-days", PROFESSIONAL)))
        .respond_with(ResponseTemplate::new(500).set_body_json(MockClinicResponses::error_response("boom")))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server);
    let result = BlockedDayIndex::load(&gateway, PROFESSIONAL, monday(), monday()).await;

    assert_matches!(result, Err(AvailabilityError::AvailabilityQuery(_)));
}

#[tokio::test]
async fn test_resolver_inverts_available_hours() {
    let mock_server = MockServer::start().await;
    mount_available_hours(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(MockClinicResponses::available_hours(&[10, 11, 15])),
    )
    .await;

    let occupied = resolver_for(&mock_server).load_for_day(PROFESSIONAL, monday(), None).await;

    assert!(occupied.is_verified());
    assert_eq!(occupied.hours().collect::<Vec<_>>(), vec![12, 13, 14, 16, 17]);
}

#[tokio::test]
async fn test_resolver_applies_reschedule_exception() {
    let mock_server = MockServer::start().await;
    mount_available_hours(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(MockClinicResponses::available_hours(&[10])),
    )
    .await;

    let ctx = RescheduleContext {
        appointment_id: 301,
        professional_id: PROFESSIONAL,
        date: monday(),
        hour: 14,
    };
    let occupied = resolver_for(&mock_server).load_for_day(PROFESSIONAL, monday(), Some(&ctx)).await;

    assert!(!occupied.is_occupied(14));
    assert!(occupied.is_occupied(15));
}

#[tokio::test]
async fn test_resolver_fails_closed_on_server_error() {
    let mock_server = MockServer::start().await;
    mount_available_hours(&mock_server, ResponseTemplate::new(500)).await;

    let occupied = resolver_for(&mock_server).load_for_day(PROFESSIONAL, monday(), None).await;

    assert!(!occupied.is_verified());
    assert!((10..=17).all(|hour| occupied.is_occupied(hour)));
}

#[tokio::test]
async fn test_resolver_fails_closed_on_malformed_hours() {
    let mock_server = MockServer::start().await;
    mount_available_hours(&mock_server, ResponseTemplate::new(200).set_body_json(json!(["10:30", "11:00"]))).await;

    let occupied = resolver_for(&mock_server).load_for_day(PROFESSIONAL, monday(), None).await;

    assert!(!occupied.is_verified());
    assert!(occupied.is_occupied(11));
}

#[tokio::test]
async fn test_unexpected_body_shape_is_malformed_response() {
    let mock_server = MockServer::start().await;
    mount_available_hours(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(json!({"hours": ["10:00"]})),
    )
    .await;

    let result = gateway_for(&mock_server).get_available_hours(PROFESSIONAL, monday()).await;

    assert_matches!(result, Err(GatewayError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_book_posts_new_appointment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/appointments"))
        .and(body_json(json!({
            "professional_id": PROFESSIONAL,
            "date_time": "2024-06-10T15:00:00",
            "motive": "Control anual",
            "patient_contact": {
                "name": "Ana Pérez",
                "email": "ana@example.com",
                "phone": null
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(MockClinicResponses::submission_ok()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = SubmissionService::new(Arc::new(gateway_for(&mock_server)));
    let receipt = service
        .book(&NewAppointment {
            professional_id: PROFESSIONAL,
            date_time: monday().and_hms_opt(15, 0, 0).unwrap(),
            motive: "Control anual".to_string(),
            patient_contact: PatientContact {
                name: "Ana Pérez".to_string(),
                email: Some("ana@example.com".to_string()),
                phone: None,
            },
        })
        .await
        .unwrap();

    assert_eq!(receipt.message.as_deref(), Some("Solicitud registrada"));
}

#[tokio::test]
async fn test_patient_reschedule_uses_put() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/appointments/301/reschedule"))
        .and(body_json(json!({"new_date_time": "2024-06-10T11:00:00"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockClinicResponses::submission_ok()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = SubmissionService::new(Arc::new(gateway_for(&mock_server)));
    service.reschedule(301, monday().and_hms_opt(11, 0, 0).unwrap()).await.unwrap();
}

#[tokio::test]
async fn test_professional_reschedule_posts_action() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/appointments/301/actions"))
        .and(body_json(json!({
            "action": "REPROGRAMAR",
            "new_date_time": "2024-06-10T16:00:00"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockClinicResponses::submission_ok()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = SubmissionService::new(Arc::new(gateway_for(&mock_server)));
    service
        .professional_reschedule(301, monday().and_hms_opt(16, 0, 0).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_confirm_action_omits_date_time() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/appointments/301/actions"))
        .and(body_json(json!({"action": "CONFIRMAR"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockClinicResponses::submission_ok()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let receipt = gateway_for(&mock_server)
        .submit_professional_action(301, ProfessionalAction::Confirm, None)
        .await
        .unwrap();

    assert!(receipt.ok);
}

#[tokio::test]
async fn test_conflict_message_is_surfaced_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/appointments/301/reschedule"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(MockClinicResponses::error_response("La hora ya no está disponible")),
        )
        .mount(&mock_server)
        .await;

    let service = SubmissionService::new(Arc::new(gateway_for(&mock_server)));
    let err = service
        .reschedule(301, monday().and_hms_opt(11, 0, 0).unwrap())
        .await
        .unwrap_err();

    assert_eq!(err, AvailabilityError::Submission("La hora ya no está disponible".to_string()));
}

#[tokio::test]
async fn test_declined_submission_uses_backend_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/appointments/301/cancel-request"))
        .and(body_json(json!({})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockClinicResponses::submission_rejected("Fuera de plazo para cancelar")),
        )
        .mount(&mock_server)
        .await;

    let service = SubmissionService::new(Arc::new(gateway_for(&mock_server)));
    let err = service.request_cancellation(301).await.unwrap_err();

    assert_eq!(err, AvailabilityError::Submission("Fuera de plazo para cancelar".to_string()));
}

#[tokio::test]
async fn test_unreachable_backend_uses_fallback_message() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();
    drop(mock_server);

    let gateway = HttpAppointmentGateway::new(&TestConfig::with_backend(uri).to_app_config(), None);
    let service = SubmissionService::new(Arc::new(gateway));
    let err = service.request_cancellation(301).await.unwrap_err();

    assert_eq!(err, AvailabilityError::Submission(SUBMISSION_FALLBACK_MESSAGE.to_string()));
}
