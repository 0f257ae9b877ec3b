use super::models::{
    CoverageTime, Dataset, DatasetFile, FileFormat, Metadata, Role, UpdateFrequency, User,
    Visibility,
};
use chrono::{DateTime, Utc};

fn user(id: &str, name: &str, email: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
    }
}

fn at(epoch_seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(epoch_seconds, 0).unwrap_or_default()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn users() -> Vec<User> {
    vec![
        user("user-1", "Alice", "alice@example.com", Role::Admin),
        user("user-2", "Bob", "bob@example.com", Role::DataOwner),
        user("user-3", "Charlie", "charlie@example.com", Role::Contributor),
        user("user-4", "Diana", "diana@example.com", Role::Viewer),
    ]
}

pub fn datasets() -> Vec<Dataset> {
    vec![
        Dataset {
            id: "ds-1".to_string(),
            title: "City Air Quality Readings".to_string(),
            description: "Hourly particulate and ozone readings from municipal sensors."
                .to_string(),
            owner_id: "user-2".to_string(),
            contributor_ids: strings(&["user-3"]),
            visibility: Visibility::Public,
            metadata: Metadata {
                keywords: strings(&["air quality", "pm2.5", "ozone"]),
                categories: strings(&["Environment"]),
                publisher: "Environmental Monitoring Office".to_string(),
                contact_email: "bob@example.com".to_string(),
                coverage_geographic: "Metropolitan area".to_string(),
                coverage_time: CoverageTime {
                    start_date: "2023-01-01".to_string(),
                    end_date: "2023-12-31".to_string(),
                },
                methodology: Some("Calibrated optical sensors, hourly averages.".to_string()),
                data_dictionary: "station_id, timestamp, pm25, pm10, o3".to_string(),
                license: "CC-BY-4.0".to_string(),
                update_frequency: UpdateFrequency::Daily,
                version: "2.1.0".to_string(),
                data_quality_notes: Some("Gaps during sensor maintenance windows.".to_string()),
            },
            files: vec![DatasetFile {
                name: "air_quality_2023.csv".to_string(),
                url: "/files/air_quality_2023.csv".to_string(),
                format: FileFormat::Csv,
            }],
            created_at: at(1_673_776_800),
            updated_at: at(1_704_067_200),
        },
        Dataset {
            id: "ds-2".to_string(),
            title: "Public Transit Ridership".to_string(),
            description: "Monthly boardings per route across bus and light rail.".to_string(),
            owner_id: "user-2".to_string(),
            contributor_ids: Vec::new(),
            visibility: Visibility::Public,
            metadata: Metadata {
                keywords: strings(&["transit", "ridership"]),
                categories: strings(&["Transportation"]),
                publisher: "Transit Authority".to_string(),
                contact_email: "bob@example.com".to_string(),
                coverage_geographic: "Regional transit network".to_string(),
                coverage_time: CoverageTime {
                    start_date: "2019-01-01".to_string(),
                    end_date: "2023-12-31".to_string(),
                },
                methodology: None,
                data_dictionary: "route_id, month, mode, boardings".to_string(),
                license: "ODbL-1.0".to_string(),
                update_frequency: UpdateFrequency::Monthly,
                version: "1.4.0".to_string(),
                data_quality_notes: None,
            },
            files: vec![
                DatasetFile {
                    name: "ridership.xlsx".to_string(),
                    url: "/files/ridership.xlsx".to_string(),
                    format: FileFormat::Xlsx,
                },
                DatasetFile {
                    name: "routes.json".to_string(),
                    url: "/files/routes.json".to_string(),
                    format: FileFormat::Json,
                },
            ],
            created_at: at(1_646_092_800),
            updated_at: at(1_701_388_800),
        },
        Dataset {
            id: "ds-3".to_string(),
            title: "Household Energy Survey".to_string(),
            description: "Anonymised responses on household energy use and heating sources."
                .to_string(),
            owner_id: "user-2".to_string(),
            contributor_ids: strings(&["user-3"]),
            visibility: Visibility::Private,
            metadata: Metadata {
                keywords: strings(&["energy", "survey", "households"]),
                categories: strings(&["Energy", "Social"]),
                publisher: "Statistics Unit".to_string(),
                contact_email: "bob@example.com".to_string(),
                coverage_geographic: "National".to_string(),
                coverage_time: CoverageTime {
                    start_date: "2022-03-01".to_string(),
                    end_date: "2022-09-30".to_string(),
                },
                methodology: Some("Stratified random sample, weighted responses.".to_string()),
                data_dictionary: "respondent_id, region, heating_type, kwh_annual".to_string(),
                license: "Restricted".to_string(),
                update_frequency: UpdateFrequency::OneTime,
                version: "1.0.0".to_string(),
                data_quality_notes: None,
            },
            files: vec![DatasetFile {
                name: "energy_survey.csv".to_string(),
                url: "/files/energy_survey.csv".to_string(),
                format: FileFormat::Csv,
            }],
            created_at: at(1_667_260_800),
            updated_at: at(1_667_260_800),
        },
    ]
}
