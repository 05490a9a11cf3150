//! Built-in sample circulars for demos and fresh installs.

use chrono::{Duration, Utc};

use crate::model::{Attachment, CircularDraft, Comment, ReadReceipt, Role};

/// Drafts inserted by `circlr seed`.
///
/// Timestamps are relative to now so a freshly seeded board always shows a
/// mix of recent and week-old notices.
pub fn sample_circulars() -> Vec<CircularDraft> {
    let now = Utc::now();
    vec![
        CircularDraft {
            title: "End Semester Examination Schedule".into(),
            content: "All students are hereby informed that the end semester examinations \
                      for the academic year will commence from December 15. Students must \
                      collect their hall tickets from the examination cell by December 10. \
                      Those with pending fees will not be issued hall tickets. Ensure all \
                      library books are returned before the exam period."
                .into(),
            priority: Some("urgent".into()),
            department: "All".into(),
            year: "All".into(),
            author: "Dr. Rajesh Kumar".into(),
            published_at: Some(now - Duration::days(1)),
            read_by: vec![
                ReadReceipt {
                    name: "Priya Sharma".into(),
                    read_at: now - Duration::hours(22),
                },
                ReadReceipt {
                    name: "Rahul Verma".into(),
                    read_at: now - Duration::hours(21),
                },
            ],
            total_recipients: 450,
            attachments: vec![Attachment {
                name: "Exam_Schedule.pdf".into(),
                kind: "pdf".into(),
                size: "2.4 MB".into(),
            }],
            comments: vec![Comment {
                author: "Priya Sharma".into(),
                role: Role::Student,
                content: "Will the practical exams be before or after theory?".into(),
                timestamp: now - Duration::hours(20),
            }],
            tags: vec!["examination".into(), "schedule".into()],
            version: Some(2),
            template: Some("Exam Notice".into()),
            ..CircularDraft::default()
        },
        CircularDraft {
            title: "Annual Tech Fest 'InnoVate' Registration Open".into(),
            content: "We are excited to announce that registration for InnoVate is now \
                      open! The fest will feature coding competitions, hackathons, \
                      robotics challenges, and guest lectures from industry leaders. \
                      Early bird registration closes on November 30."
                .into(),
            priority: Some("informational".into()),
            department: "CSE".into(),
            year: "All".into(),
            author: "Prof. Anita Desai".into(),
            published_at: Some(now - Duration::days(3)),
            read_by: vec![
                ReadReceipt {
                    name: "Amit Patel".into(),
                    read_at: now - Duration::days(2),
                },
                ReadReceipt {
                    name: "Sneha Iyer".into(),
                    read_at: now - Duration::days(2),
                },
                ReadReceipt {
                    name: "Vikram Singh".into(),
                    read_at: now - Duration::days(1),
                },
            ],
            total_recipients: 200,
            attachments: vec![
                Attachment {
                    name: "InnoVate_Brochure.pdf".into(),
                    kind: "pdf".into(),
                    size: "5.1 MB".into(),
                },
                Attachment {
                    name: "Registration_Form.pdf".into(),
                    kind: "pdf".into(),
                    size: "1.2 MB".into(),
                },
            ],
            tags: vec!["techfest".into(), "event".into(), "registration".into()],
            ..CircularDraft::default()
        },
        CircularDraft {
            title: "Fee Payment Reminder".into(),
            content: "Students are reminded that the last date for fee payment without \
                      late charges is approaching. Payments can be made online through \
                      the student portal or at the accounts office."
                .into(),
            priority: Some("action-required".into()),
            department: "All".into(),
            year: "All".into(),
            author: "Accounts Office".into(),
            published_at: Some(now - Duration::days(5)),
            total_recipients: 450,
            tags: vec!["fees".into()],
            template: Some("Fee Notice".into()),
            ..CircularDraft::default()
        },
        CircularDraft {
            title: "Library Renovation".into(),
            content: "The central library reading hall will remain closed for renovation \
                      work. Reference services continue from the annex building."
                .into(),
            priority: Some("informational".into()),
            department: "All".into(),
            year: "All".into(),
            author: "Chief Librarian".into(),
            published_at: Some(now - Duration::days(10)),
            total_recipients: 450,
            read_by: vec![ReadReceipt {
                name: "Priya Sharma".into(),
                read_at: now - Duration::days(9),
            }],
            tags: vec!["library".into()],
            ..CircularDraft::default()
        },
    ]
}
