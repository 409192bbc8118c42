use crate::infra::{load_roster, PlacementServices};
use chrono::{DateTime, Utc};
use clap::Args;
use internship_hub::error::AppError;
use internship_hub::workflows::contract::{Contract, NewContract, SigningRole};
use internship_hub::workflows::curriculum::{CurriculumReview, CurriculumUpload};
use internship_hub::workflows::identity::{
    DirectoryRoster, ManagerId, MonitorId, OfferId, Student, SupervisorId,
};
use std::path::{Path, PathBuf};

const SAMPLE_CV: &[u8] = b"%PDF-1.4\n% sample curriculum generated for the placement demo\n";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Curriculum file to upload. Defaults to a small built-in PDF.
    #[arg(long)]
    pub(crate) cv: Option<PathBuf>,
    /// Roster CSV used to seed the identity store. Defaults to the demo roster.
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let roster = load_roster(args.roster.as_deref())?;
    let Some(cast) = Cast::pick(&roster) else {
        println!("The roster needs a student, a manager, and an offer to run the demo.");
        return Ok(());
    };

    let services = PlacementServices::in_memory(roster);
    let upload = read_upload(args.cv.as_deref(), &cast.student)?;

    println!("Internship placement demo");
    println!(
        "Student: {} (matricule {})",
        cast.student.full_name(),
        cast.student.matricule
    );

    println!("\nCurriculum");
    let curriculum = match services.curricula.upload(upload) {
        Ok(curriculum) => curriculum,
        Err(err) => {
            println!("  Upload rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "  Uploaded '{}' ({}, {} bytes) as curriculum {}",
        curriculum.name,
        curriculum.mime_type,
        curriculum.data.len(),
        curriculum.id
    );
    match services.curricula.students_awaiting_review() {
        Ok(students) => println!("  Students awaiting review: {}", names(&students)),
        Err(err) => println!("  Review queue unavailable: {err}"),
    }

    let review = CurriculumReview {
        curriculum_id: Some(curriculum.id),
        valid: true,
    };
    match services.curricula.validate(review) {
        Ok(decided) => println!("  Review recorded: {}", decided.validity.label()),
        Err(err) => println!("  Review rejected: {err}"),
    }
    match services.curricula.validate(review) {
        Ok(_) => println!("  Second review unexpectedly accepted"),
        Err(err) => println!("  Second review refused: {err}"),
    }
    match services.curricula.students_ready_for_assignment() {
        Ok(students) => println!("  Ready for supervisor assignment: {}", names(&students)),
        Err(err) => println!("  Assignment report unavailable: {err}"),
    }
    if let Some(supervisor) = cast.supervisor {
        match services
            .directory
            .assign_supervisor(cast.student.id, supervisor)
        {
            Ok(_) => println!("  Supervisor {supervisor} assigned"),
            Err(err) => println!("  Supervisor assignment failed: {err}"),
        }
    }

    println!("\nContract");
    let request = NewContract {
        offer_id: Some(cast.offer),
        student_id: Some(cast.student.id),
        manager_id: Some(cast.manager),
        monitor_id: Some(cast.monitor),
    };
    let contract = match services.contracts.create_from_accepted_application(request) {
        Ok(contract) => contract,
        Err(err) => {
            println!("  Contract could not be drafted: {err}");
            return Ok(());
        }
    };
    println!(
        "  Drafted contract {} for '{}'",
        contract.id, contract.offer.title
    );

    match services.contracts.sign(contract.id, SigningRole::Student) {
        Ok(_) => println!("  Student signature unexpectedly accepted"),
        Err(err) => println!("  Early student signature refused: {err}"),
    }
    for role in SigningRole::ordered() {
        match services.contracts.sign(contract.id, role) {
            Ok(signed) => println!("  {role} signed -> {}", signed.stage().label()),
            Err(err) => {
                println!("  {role} signature rejected: {err}");
                return Ok(());
            }
        }
    }

    match services.contracts.by_matricule(&cast.student.matricule) {
        Ok(Some(contract)) => render_signatures(&contract),
        Ok(None) => println!("  No contract on file for the student"),
        Err(err) => println!("  Contract lookup failed: {err}"),
    }

    Ok(())
}

/// Parties the demo walks through, taken from the front of the roster.
struct Cast {
    student: Student,
    manager: ManagerId,
    monitor: MonitorId,
    supervisor: Option<SupervisorId>,
    offer: OfferId,
}

impl Cast {
    fn pick(roster: &DirectoryRoster) -> Option<Self> {
        let student = roster.students.first()?.clone();
        let manager = roster.managers.first()?.id;
        let offer = roster.offers.first()?;
        Some(Self {
            student,
            manager,
            monitor: offer.creator,
            supervisor: roster.supervisors.first().map(|supervisor| supervisor.id),
            offer: offer.id,
        })
    }
}

fn read_upload(path: Option<&Path>, student: &Student) -> Result<CurriculumUpload, AppError> {
    let upload = match path {
        Some(path) => CurriculumUpload {
            file_name: path.to_string_lossy().into_owned(),
            mime_type: mime_guess::from_path(path)
                .first()
                .map(|mime| mime.essence_str().to_string()),
            data: std::fs::read(path)?,
            student_id: Some(student.id),
        },
        None => CurriculumUpload {
            file_name: "résumé.pdf".to_string(),
            mime_type: Some("application/pdf".to_string()),
            data: SAMPLE_CV.to_vec(),
            student_id: Some(student.id),
        },
    };
    Ok(upload)
}

fn names(students: &[Student]) -> String {
    if students.is_empty() {
        return "none".to_string();
    }
    students
        .iter()
        .map(Student::full_name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_signatures(contract: &Contract) {
    let slots = [
        (SigningRole::Manager, contract.manager_signature()),
        (SigningRole::Monitor, contract.monitor_signature()),
        (SigningRole::Student, contract.student_signature()),
    ];
    println!("  Contract {} is {}", contract.id, contract.stage().label());
    for (role, signature) in slots {
        let when = signature
            .map(|signature| timestamp(signature.signed_at))
            .unwrap_or_else(|| "unsigned".to_string());
        println!("    {role}: {when}");
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
