use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>) -> Router {
    let uploads_dir = state.config.uploads_dir.clone();
    let body_limit = state.config.max_upload_bytes;
    let cors = cors_layer(&state.config.frontend_origins);

    Router::new()
        .route("/health", get(handlers::healthcheck))
        // Auth routes
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/profile", get(handlers::auth::get_profile))
        .route("/api/auth/profile", put(handlers::auth::update_profile))
        .route("/api/auth/profile/image", post(handlers::auth::upload_profile_image))
        .route("/api/auth/settings", put(handlers::auth::update_settings))
        .route("/api/auth/change-password", put(handlers::auth::change_password))
        .route("/api/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/api/auth/reset-password", post(handlers::auth::reset_password))
        .route("/api/auth/link-tenant", put(handlers::auth::link_tenant))
        // Room routes
        .route("/api/rooms", get(handlers::rooms::list_rooms))
        .route("/api/rooms", post(handlers::rooms::create_room))
        .route("/api/rooms/stats", get(handlers::rooms::room_stats))
        .route("/api/rooms/:id", get(handlers::rooms::get_room))
        .route("/api/rooms/:id", put(handlers::rooms::update_room))
        .route("/api/rooms/:id", delete(handlers::rooms::delete_room))
        // Tenant routes
        .route("/api/tenants", get(handlers::tenants::list_tenants))
        .route("/api/tenants", post(handlers::tenants::create_tenant))
        .route("/api/tenants/stats", get(handlers::tenants::tenant_stats))
        .route("/api/tenants/dashboard/my-info", get(handlers::tenants::tenant_dashboard))
        .route("/api/tenants/onboard", post(handlers::tenants::onboard_tenant))
        .route("/api/tenants/send-sms", post(handlers::tenants::send_sms))
        .route("/api/tenants/send-manual-sms", post(handlers::tenants::send_manual_sms))
        .route("/api/tenants/:id", get(handlers::tenants::get_tenant))
        .route("/api/tenants/:id", put(handlers::tenants::update_tenant))
        .route("/api/tenants/:id", delete(handlers::tenants::delete_tenant))
        .route("/api/tenants/:id/approve", put(handlers::tenants::approve_tenant))
        .route("/api/tenants/:id/reject", put(handlers::tenants::reject_tenant))
        .route("/api/tenants/:id/vacate", post(handlers::tenants::vacate_tenant))
        // Payment routes
        .route("/api/payments", get(handlers::payments::list_payments))
        .route("/api/payments", post(handlers::payments::create_payment))
        .route("/api/payments/my", get(handlers::payments::my_payments))
        // Ticket routes
        .route("/api/tickets", get(handlers::tickets::list_tickets))
        .route("/api/tickets", post(handlers::tickets::create_ticket))
        .route("/api/tickets/my", get(handlers::tickets::my_tickets))
        .route("/api/tickets/:id/status", put(handlers::tickets::update_ticket_status))
        // Super-admin routes
        .route("/api/superadmin/stats", get(handlers::superadmin::platform_stats))
        .route("/api/superadmin/hostels", get(handlers::superadmin::list_hostels))
        .route("/api/superadmin/hostels", post(handlers::superadmin::create_hostel))
        .route("/api/superadmin/hostels-unassigned", get(handlers::superadmin::list_unassigned_hostels))
        .route("/api/superadmin/hostels/:id", get(handlers::superadmin::get_hostel))
        .route("/api/superadmin/hostels/:id", put(handlers::superadmin::update_hostel))
        .route("/api/superadmin/hostels/:id", delete(handlers::superadmin::delete_hostel))
        .route("/api/superadmin/hostels/:id/verify", put(handlers::superadmin::verify_hostel))
        .route(
            "/api/superadmin/hostels/:id/documents/:kind",
            put(handlers::superadmin::upload_hostel_document),
        )
        .route("/api/superadmin/admins", get(handlers::superadmin::list_admins))
        .route("/api/superadmin/admins", post(handlers::superadmin::create_admin))
        .route("/api/superadmin/admins/:id", put(handlers::superadmin::update_admin))
        .route("/api/superadmin/admins/:id", delete(handlers::superadmin::delete_admin))
        .route("/api/superadmin/admins/:id/role", put(handlers::superadmin::update_admin_role))
        // Uploaded files
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        // Add state and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// CORS for the SPA origins; credentials are allowed so origins must be explicit
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio_test::assert_ok;
    use tower::ServiceExt;

    use crate::auth::{hash_password, issue_token};
    use crate::config::Config;
    use crate::db::Store;
    use crate::models::*;
    use crate::notify::{testing::RecordingSms, SmsSender};

    struct Harness {
        app: Router,
        state: Arc<AppState>,
        sms: Arc<RecordingSms>,
    }

    async fn harness(sms: RecordingSms) -> Harness {
        let mut config = Config::load();
        config.jwt_secret = "router-test-secret".to_string();
        config.bcrypt_cost = 4;
        config.uploads_dir = std::env::temp_dir()
            .join(format!("hostel-hub-test-{}", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned();

        let sms = Arc::new(sms);
        let sender: Arc<dyn SmsSender> = sms.clone();
        let state = Arc::new(AppState {
            store: Store::in_memory().await.unwrap(),
            config,
            sms: sender,
        });
        Harness {
            app: build(state.clone()),
            state,
            sms,
        }
    }

    impl Harness {
        async fn user(&self, email: &str, role: Role, property_id: Option<i64>) -> (User, String) {
            let user = self
                .state
                .store
                .create_user(&NewUser {
                    name: "Test User".to_string(),
                    email: email.to_string(),
                    phone: "9876543210".to_string(),
                    password_hash: hash_password("Str0ng!pass", 4).unwrap(),
                    role,
                    property_id,
                    verification_status: UserVerificationStatus::Verified,
                    organizational_code: None,
                })
                .await
                .unwrap();
            let token = issue_token(&self.state.config, &user).unwrap();
            (user, token)
        }

        async fn hostel(&self) -> Property {
            self.state
                .store
                .create_property(&CreatePropertyRequest {
                    name: "Lake View PG".to_string(),
                    address: "12 Lake Road".to_string(),
                    owner_id: None,
                    owner_details: OwnerDetails::default(),
                })
                .await
                .unwrap()
        }

        async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                req = req.header("authorization", format!("Bearer {}", token));
            }
            let req = match body {
                Some(body) => req
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string())),
                None => req.body(Body::empty()),
            }
            .unwrap();

            let resp = self.app.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness(RecordingSms::default()).await;
        let (status, body) = h.call("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_missing_and_bad_tokens_are_401() {
        let h = harness(RecordingSms::default()).await;

        let (status, body) = h.call("GET", "/api/rooms", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized, no token");

        let (status, body) = h.call("GET", "/api/rooms", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized, token failed");
    }

    #[tokio::test]
    async fn test_role_gates_return_403() {
        let h = harness(RecordingSms::default()).await;
        let (_, tenant_token) = h.user("tenant@example.com", Role::Tenant, None).await;
        let (_, staff_token) = h.user("staff@example.com", Role::Staff, None).await;

        let (status, _) = h.call("GET", "/api/tenants", Some(&tenant_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = h.call("GET", "/api/tenants", Some(&staff_token), None).await;
        assert_eq!(status, StatusCode::OK);

        let room = json!({"number": "101", "rent": 5000});
        let (status, _) = h.call("POST", "/api/rooms", Some(&staff_token), Some(room)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = h.call("GET", "/api/superadmin/stats", Some(&staff_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let h = harness(RecordingSms::default()).await;
        let hostel = h.hostel().await;

        let signup = json!({
            "name": "Priya Sharma",
            "email": "Priya@Example.com",
            "phone": "9876543210",
            "password": "Str0ng!pass",
            "organizationalCode": hostel.organizational_code,
        });
        let (status, body) = h.call("POST", "/api/auth/register", None, Some(signup.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "tenant");
        assert_eq!(body["email"], "priya@example.com");

        let (status, body) = h.call("POST", "/api/auth/register", None, Some(signup)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User already exists");

        let login = json!({"email": "priya@example.com", "password": "Str0ng!pass"});
        let (status, body) = h.call("POST", "/api/auth/login", None, Some(login)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["requiresOnboarding"], true);

        let user = assert_ok!(h.state.store.get_user_by_email("priya@example.com").await).unwrap();
        assert_eq!(user.property_id, Some(hostel.id));

        let wrong = json!({"email": "priya@example.com", "password": "Wr0ng!pass"});
        let (status, body) = h.call("POST", "/api/auth/login", None, Some(wrong)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid credentials");

        let bad_code = json!({
            "name": "Arjun",
            "email": "arjun@example.com",
            "phone": "9876543211",
            "password": "Str0ng!pass",
            "organizationalCode": "ORG-NOPE",
        });
        let (status, body) = h.call("POST", "/api/auth/register", None, Some(bad_code)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid organizational code");
    }

    #[tokio::test]
    async fn test_onboard_approve_flow_survives_sms_failure() {
        let h = harness(RecordingSms::failing()).await;
        let hostel = h.hostel().await;
        let (_, admin_token) = h.user("admin@example.com", Role::Admin, Some(hostel.id)).await;
        let (_, first_token) = h.user("first@example.com", Role::Tenant, Some(hostel.id)).await;
        let (_, second_token) = h.user("second@example.com", Role::Tenant, Some(hostel.id)).await;

        let room = json!({"number": "201", "type": "single", "rent": 6500, "capacity": 1});
        let (status, room) = h.call("POST", "/api/rooms", Some(&admin_token), Some(room)).await;
        assert_eq!(status, StatusCode::CREATED);
        let room_id = room["id"].as_i64().unwrap();

        let application = json!({"room": room_id, "moveInDate": "2025-07-01", "termsAccepted": true});
        let (status, onboarded) = h
            .call("POST", "/api/tenants/onboard", Some(&first_token), Some(application.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(onboarded["approvalStatus"], "pending");
        assert_eq!(onboarded["message"], "Registration submitted. Awaiting admin approval.");
        let tenant_id = onboarded["id"].as_i64().unwrap();

        // onboarding reserves nothing, so a second applicant may pick the same room
        let (status, second) = h
            .call("POST", "/api/tenants/onboard", Some(&second_token), Some(application))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let second_id = second["id"].as_i64().unwrap();

        let uri = format!("/api/tenants/{}/approve", tenant_id);
        let (status, body) = h.call("PUT", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tenant"]["approvalStatus"], "approved");
        assert_eq!(body["tenant"]["active"], true);
        assert_eq!(h.sms.messages().len(), 1);
        assert!(h.sms.messages()[0].1.starts_with("Hello Test, your tenant registration has been approved!"));

        let (_, room) = h.call("GET", &format!("/api/rooms/{}", room_id), Some(&admin_token), None).await;
        assert_eq!(room["occupancy"], 1);
        assert_eq!(room["status"], "occupied");

        let (status, body) = h.call("PUT", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Tenant is already approved");

        let uri = format!("/api/tenants/{}/approve", second_id);
        let (status, body) = h.call("PUT", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Room is fully occupied");

        let second = assert_ok!(h.state.store.get_tenant(second_id).await).unwrap();
        assert_eq!(second.approval_status, ApprovalStatus::Pending);

        let (status, body) = h
            .call("PUT", &format!("/api/tenants/{}/reject", second_id), Some(&admin_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tenant"]["rejectionReason"], "No reason provided");

        let (status, body) = h
            .call("DELETE", &format!("/api/tenants/{}", tenant_id), Some(&admin_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Tenant removed");

        let (_, room) = h.call("GET", &format!("/api/rooms/{}", room_id), Some(&admin_token), None).await;
        assert_eq!(room["occupancy"], 0);
        assert_eq!(room["status"], "available");
    }

    #[tokio::test]
    async fn test_tenant_cannot_read_other_profiles() {
        let h = harness(RecordingSms::default()).await;
        let hostel = h.hostel().await;
        let (admin, admin_token) = h.user("admin@example.com", Role::Admin, Some(hostel.id)).await;
        let (_, tenant_token) = h.user("resident@example.com", Role::Tenant, Some(hostel.id)).await;

        let other = h
            .state
            .store
            .create_tenant(&NewTenant {
                property_id: Some(hostel.id),
                first_name: "Other".to_string(),
                last_name: None,
                email: "other@example.com".to_string(),
                phone: None,
                room_id: None,
                details: TenantDetails::default(),
                terms_accepted: false,
                organizational_code: None,
                admission: Admission::Direct { approved_by: admin.id },
            })
            .await
            .unwrap();

        let uri = format!("/api/tenants/{}", other.id);
        let (status, _) = h.call("GET", &uri, Some(&tenant_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = h.call("GET", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["firstName"], "Other");
    }

    #[tokio::test]
    async fn test_link_tenant_checks_target_account() {
        let h = harness(RecordingSms::default()).await;
        let hostel = h.hostel().await;
        let elsewhere = h.hostel().await;
        let (_, admin_token) = h.user("admin@example.com", Role::Admin, Some(hostel.id)).await;
        let (resident, _) = h.user("resident@example.com", Role::Tenant, Some(hostel.id)).await;
        let (roommate, _) = h.user("roommate@example.com", Role::Tenant, Some(hostel.id)).await;
        let (outsider, _) = h.user("outsider@example.com", Role::Tenant, Some(elsewhere.id)).await;
        let (staff, _) = h.user("staff@example.com", Role::Staff, Some(hostel.id)).await;

        let profile = h
            .state
            .store
            .create_tenant(&NewTenant {
                property_id: Some(hostel.id),
                first_name: "Resident".to_string(),
                last_name: None,
                email: "resident-profile@example.com".to_string(),
                phone: None,
                room_id: None,
                details: TenantDetails::default(),
                terms_accepted: true,
                organizational_code: None,
                admission: Admission::SelfService,
            })
            .await
            .unwrap();
        let link = |user_id: i64| Some(json!({"userId": user_id, "tenantId": profile.id}));

        let (status, _) = h.call("PUT", "/api/auth/link-tenant", Some(&admin_token), link(outsider.id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = h.call("PUT", "/api/auth/link-tenant", Some(&admin_token), link(staff.id)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Only tenant accounts can be linked to a tenant profile");

        let (status, body) = h.call("PUT", "/api/auth/link-tenant", Some(&admin_token), link(resident.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tenantId"], profile.id);

        let (status, body) = h.call("PUT", "/api/auth/link-tenant", Some(&admin_token), link(roommate.id)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Tenant profile is already linked to another account");

        let roommate = h.state.store.get_user(roommate.id).await.unwrap().unwrap();
        assert!(roommate.tenant_id.is_none());
        let outsider = h.state.store.get_user(outsider.id).await.unwrap().unwrap();
        assert!(outsider.tenant_id.is_none());
    }

    #[tokio::test]
    async fn test_send_sms_reports_per_tenant_results() {
        let h = harness(RecordingSms::default()).await;
        let hostel = h.hostel().await;
        let (admin, admin_token) = h.user("admin@example.com", Role::Admin, Some(hostel.id)).await;

        let mut ids = Vec::new();
        for (email, phone) in [("a@example.com", Some("9000000001")), ("b@example.com", None)] {
            let tenant = h
                .state
                .store
                .create_tenant(&NewTenant {
                    property_id: Some(hostel.id),
                    first_name: "Resident".to_string(),
                    last_name: None,
                    email: email.to_string(),
                    phone: phone.map(str::to_string),
                    room_id: None,
                    details: TenantDetails::default(),
                    terms_accepted: false,
                    organizational_code: None,
                    admission: Admission::Direct { approved_by: admin.id },
                })
                .await
                .unwrap();
            ids.push(tenant.id);
        }

        let req = json!({"tenantIds": ids, "message": "water supply off tomorrow"});
        let (status, body) = h.call("POST", "/api/tenants/send-sms", Some(&admin_token), Some(req)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "SMS sent to 1 tenants, 1 failed");
        assert_eq!(h.sms.messages()[0].1, "Hello Resident, water supply off tomorrow");

        let empty = json!({"tenantIds": [], "message": "hi"});
        let (status, _) = h.call("POST", "/api/tenants/send-sms", Some(&admin_token), Some(empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_manual_sms_gateway_failure_is_502() {
        let h = harness(RecordingSms::failing()).await;
        let (_, admin_token) = h.user("admin@example.com", Role::Admin, None).await;

        let req = json!({"phone": "9876543210", "message": "Rent reminder"});
        let (status, body) = h.call("POST", "/api/tenants/send-manual-sms", Some(&admin_token), Some(req)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"], "gateway unavailable");
    }

    #[tokio::test]
    async fn test_superadmin_role_management() {
        let h = harness(RecordingSms::default()).await;
        let (root, root_token) = h.user("root@example.com", Role::SuperAdmin, None).await;
        let (staff, _) = h.user("staff@example.com", Role::Staff, None).await;

        let uri = format!("/api/superadmin/admins/{}/role", root.id);
        let (status, _) = h.call("PUT", &uri, Some(&root_token), Some(json!({"role": "admin"}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/api/superadmin/admins/{}/role", staff.id);
        let (status, _) = h.call("PUT", &uri, Some(&root_token), Some(json!({"role": "superadmin"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = h.call("PUT", &uri, Some(&root_token), Some(json!({"role": "owner"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = h.call("PUT", &uri, Some(&root_token), Some(json!({"role": "admin"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");

        let (status, _) = h
            .call("DELETE", &format!("/api/superadmin/admins/{}", root.id), Some(&root_token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_superadmin_hostel_lifecycle() {
        let h = harness(RecordingSms::default()).await;
        let (_, root_token) = h.user("root@example.com", Role::SuperAdmin, None).await;

        let hostel = json!({"name": "Green Nest", "address": "4 Park Street", "ownerFullName": "K. Rao"});
        let (status, created) = h.call("POST", "/api/superadmin/hostels", Some(&root_token), Some(hostel)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["organizationalCode"].as_str().unwrap().starts_with("ORG-"));
        let id = created["id"].as_i64().unwrap();

        let admin = json!({
            "name": "Hostel Admin",
            "email": "warden@example.com",
            "phone": "9123456780",
            "password": "Str0ng!pass",
            "propertyId": id,
        });
        let (status, admin) = h.call("POST", "/api/superadmin/admins", Some(&root_token), Some(admin)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(admin["propertyId"], id);

        let verify = format!("/api/superadmin/hostels/{}/verify", id);
        let (status, _) = h
            .call("PUT", &verify, Some(&root_token), Some(json!({"action": "approve"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = h
            .call("PUT", &verify, Some(&root_token), Some(json!({"action": "verify"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verificationStatus"], "verified");

        let (status, detail) = h
            .call("GET", &format!("/api/superadmin/hostels/{}", id), Some(&root_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["hostel"]["ownerId"], admin["id"]);
        assert_eq!(detail["admins"].as_array().unwrap().len(), 1);

        let (status, list) = h.call("GET", "/api/superadmin/hostels?search=green", Some(&root_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["total"], 1);

        let (status, _) = h
            .call("DELETE", &format!("/api/superadmin/hostels/{}", id), Some(&root_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let warden = assert_ok!(h.state.store.get_user_by_email("warden@example.com").await).unwrap();
        assert_eq!(warden.property_id, None);
    }
}
