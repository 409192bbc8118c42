//! End-to-end placement scenarios driven through the public services and merged HTTP routers:
//! a student uploads a curriculum, a reviewer accepts it, and the three parties sign the
//! resulting contract in order.

mod common {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::response::Response;
    use axum::Router;
    use serde_json::Value;

    use internship_hub::workflows::contract::{contract_router, ContractService};
    use internship_hub::workflows::curriculum::{curriculum_router, CurriculumService};
    use internship_hub::workflows::identity::{
        directory_router, DirectoryRoster, DirectoryService,
    };
    use internship_hub::workflows::{
        InMemoryContractRepository, InMemoryCurriculumRepository, InMemoryIdentityStore,
    };

    pub const ROSTER_CSV: &str = "\
kind,id,first_name,last_name,email,matricule,department,title,creator_id
student,10,Awa,Diallo,adiallo@college.qc.ca,2233445,info,,
student,11,Liam,Pelletier,lpelletier@college.qc.ca,5566778,info,,
manager,3,Nadia,Ouellet,nouellet@college.qc.ca,,,,
monitor,7,Kevin,Morin,kmorin@ubisoft.com,,,,
supervisor,4,Chantal,Girard,cgirard@college.qc.ca,,info,,
offer,20,,,,,info,Game tools intern,7
";

    pub struct Platform {
        pub curricula: Arc<CurriculumService<InMemoryCurriculumRepository, InMemoryIdentityStore>>,
        pub contracts: Arc<ContractService<InMemoryContractRepository, InMemoryIdentityStore>>,
        pub directory: Arc<DirectoryService<InMemoryIdentityStore>>,
    }

    impl Platform {
        pub fn from_csv(csv: &str) -> Self {
            let roster = DirectoryRoster::from_reader(csv.as_bytes()).expect("roster parses");
            let identities = Arc::new(InMemoryIdentityStore::from_roster(roster));
            Self {
                curricula: Arc::new(CurriculumService::new(
                    Arc::new(InMemoryCurriculumRepository::default()),
                    identities.clone(),
                )),
                contracts: Arc::new(ContractService::new(
                    Arc::new(InMemoryContractRepository::default()),
                    identities.clone(),
                )),
                directory: Arc::new(DirectoryService::new(identities)),
            }
        }

        pub fn router(&self) -> Router {
            curriculum_router(self.curricula.clone())
                .merge(contract_router(self.contracts.clone()))
                .merge(directory_router(self.directory.clone()))
        }
    }

    pub fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request builds")
    }

    pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    pub async fn read_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }
}

use axum::http::StatusCode;
use common::{empty_request, json_request, read_json, Platform, ROSTER_CSV};
use internship_hub::workflows::contract::{ContractStage, NewContract, SigningRole};
use internship_hub::workflows::curriculum::{CurriculumUpload, Validity};
use internship_hub::workflows::identity::{ManagerId, MonitorId, OfferId, StudentId};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn accepted_curriculum_leads_to_a_fully_signed_contract() {
    let platform = Platform::from_csv(ROSTER_CSV);

    let curriculum = platform
        .curricula
        .upload(CurriculumUpload {
            file_name: "/home/awa/Documents/résumé.pdf".to_string(),
            mime_type: Some("application/pdf".to_string()),
            data: b"%PDF-1.7 awa".to_vec(),
            student_id: Some(StudentId(10)),
        })
        .expect("upload succeeds");
    assert_eq!(curriculum.name, "résumé.pdf");
    assert_eq!(curriculum.validity, Validity::Pending);

    let response = platform
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/review/curricula",
            json!({ "curriculum_id": curriculum.id, "valid": true }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let ready = read_json(
        platform
            .router()
            .oneshot(empty_request("GET", "/api/v1/reports/students/unassigned"))
            .await
            .expect("route executes"),
    )
    .await;
    assert_eq!(ready, json!([read_json_student(&platform, 10).await]));

    let response = platform
        .router()
        .oneshot(json_request(
            "PUT",
            "/api/v1/students/10/supervisor",
            json!({ "supervisor_id": 4 }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["supervisor"], 4);

    let response = platform
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/contracts",
            json!({ "offer_id": 20, "student_id": 10, "manager_id": 3, "monitor_id": 7 }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let contract_id = read_json(response).await["id"]
        .as_u64()
        .expect("contract id");

    for role in SigningRole::ordered() {
        let response = platform
            .router()
            .oneshot(empty_request(
                "POST",
                &format!("/api/v1/contracts/{contract_id}/signatures/{role}"),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK, "{role} signs");
    }

    let contract = platform
        .contracts
        .by_matricule("2233445")
        .expect("lookup")
        .expect("contract on file");
    assert_eq!(contract.stage(), ContractStage::Complete);
    assert!(platform
        .contracts
        .exists_for_student(StudentId(10))
        .expect("lookup"));
    assert!(!platform
        .contracts
        .exists_for_matricule("5566778")
        .expect("lookup"));
}

#[tokio::test]
async fn signatures_out_of_order_or_repeated_are_conflicts() {
    let platform = Platform::from_csv(ROSTER_CSV);
    let contract = platform
        .contracts
        .create_from_accepted_application(NewContract {
            offer_id: Some(OfferId(20)),
            student_id: Some(StudentId(11)),
            manager_id: Some(ManagerId(3)),
            monitor_id: Some(MonitorId(7)),
        })
        .expect("contract drafted");

    let sign = |role: &str| {
        empty_request(
            "POST",
            &format!("/api/v1/contracts/{}/signatures/{role}", contract.id),
        )
    };

    let early = platform
        .router()
        .oneshot(sign("monitor"))
        .await
        .expect("route executes");
    assert_eq!(early.status(), StatusCode::CONFLICT);

    let manager = platform
        .router()
        .oneshot(sign("manager"))
        .await
        .expect("route executes");
    assert_eq!(manager.status(), StatusCode::OK);

    let again = platform
        .router()
        .oneshot(sign("manager"))
        .await
        .expect("route executes");
    assert_eq!(again.status(), StatusCode::CONFLICT);
    assert!(read_json(again).await["error"]
        .as_str()
        .unwrap_or_default()
        .contains("already signed"));

    let queue = read_json(
        platform
            .router()
            .oneshot(empty_request(
                "GET",
                "/api/v1/monitors/7/contracts/awaiting-signature",
            ))
            .await
            .expect("route executes"),
    )
    .await;
    assert_eq!(queue[0]["stage"], "awaiting_monitor");
}

#[tokio::test]
async fn rejected_curriculum_appears_in_the_invalid_report() {
    let platform = Platform::from_csv(ROSTER_CSV);
    let curriculum = platform
        .curricula
        .upload(CurriculumUpload {
            file_name: "cv.txt".to_string(),
            mime_type: None,
            data: b"Liam Pelletier".to_vec(),
            student_id: Some(StudentId(11)),
        })
        .expect("upload succeeds");
    assert_eq!(curriculum.mime_type, "application/octet-stream");

    let response = platform
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/review/curricula",
            json!({ "curriculum_id": curriculum.id, "valid": false }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let invalid = read_json(
        platform
            .router()
            .oneshot(empty_request(
                "GET",
                "/api/v1/reports/students/invalid-curriculum",
            ))
            .await
            .expect("route executes"),
    )
    .await;
    assert_eq!(invalid[0]["matricule"], "5566778");

    let without = read_json(
        platform
            .router()
            .oneshot(empty_request(
                "GET",
                "/api/v1/reports/students/without-curriculum",
            ))
            .await
            .expect("route executes"),
    )
    .await;
    assert_eq!(without[0]["id"], 10);
}

async fn read_json_student(platform: &Platform, id: u64) -> serde_json::Value {
    read_json(
        platform
            .router()
            .oneshot(empty_request("GET", &format!("/api/v1/students/{id}")))
            .await
            .expect("route executes"),
    )
    .await
}
