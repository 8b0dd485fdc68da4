use sqlx::sqlite::SqlitePool;

pub const BASE: &str = "http://example.org/v2";

/// (treatmentId, treatmentTitle, journalTitle, journalYear, kingdom, family, fulltext, deleted)
const TREATMENTS: &[(&str, &str, &str, i64, &str, &str, &str, i64)] = &[
    ("T001", "Carabus alpha", "Zootaxa", 1999, "Animalia", "Carabidae", "ground beetle from the alps", 0),
    ("T002", "Carabus beta", "Zootaxa", 1999, "Animalia", "Carabidae", "ground beetle of the lowlands", 0),
    ("T003", "Apis gamma", "Journal of Hymenoptera Research", 2005, "Animalia", "Apidae", "honey bee", 0),
    ("T004", "Bombus delta", "ZooKeys", 2010, "Animalia", "Apidae", "bumble bee of the meadow", 0),
    ("T005", "Quercus epsilon", "Phytotaxa", 2010, "Plantae", "Fagaceae", "oak tree", 0),
    ("T006", "Carabus withdrawn", "Zootaxa", 1999, "Animalia", "Carabidae", "withdrawn beetle", 1),
];

/// (treatmentAuthorId, treatmentId, treatmentAuthor)
const AUTHORS: &[(&str, &str, &str)] = &[
    ("TA1", "T001", "Smith"),
    ("TA2", "T001", "Jones"),
    ("TA3", "T003", "Smith"),
];

/// (materialsCitationId, treatmentId, typeStatus, country, collectionCode, specimens, male, female)
const MATERIALS: &[(&str, &str, &str, &str, &str, i64, i64, i64)] = &[
    ("MC1", "T001", "holotype", "Austria", "NHMW", 3, 1, 2),
    ("MC2", "T001", "paratype", "Italy", "MSNG", 2, 1, 1),
    ("MC3", "T004", "holotype", "Germany", "ZSM", 1, 0, 1),
];

/// Five live treatments (two from 1999), one soft-deleted, and the material
/// cited by T001.
pub async fn seed(pool: &SqlitePool) -> sqlx::Result<()> {
    for &(id, title, journal, year, kingdom, family, fulltext, deleted) in TREATMENTS {
        sqlx::query(
            "INSERT INTO treatments \
             (treatmentId, treatmentTitle, journalTitle, journalYear, kingdom, family, \
              status, rank, fulltext, deleted) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'sp. nov.', 'species', ?7, ?8)",
        )
        .bind(id)
        .bind(title)
        .bind(journal)
        .bind(year)
        .bind(kingdom)
        .bind(family)
        .bind(fulltext)
        .bind(deleted)
        .execute(pool)
        .await?;

        sqlx::query("INSERT INTO vtreatments (treatmentId, fulltext) VALUES (?1, ?2)")
            .bind(id)
            .bind(fulltext)
            .execute(pool)
            .await?;
    }

    for &(id, treatment, author) in AUTHORS {
        sqlx::query(
            "INSERT INTO treatmentAuthors (treatmentAuthorId, treatmentId, treatmentAuthor) \
             VALUES (?1, ?2, ?3)",
        )
        .bind(id)
        .bind(treatment)
        .bind(author)
        .execute(pool)
        .await?;
    }

    for &(id, treatment, type_status, country, code, specimens, male, female) in MATERIALS {
        sqlx::query(
            "INSERT INTO materialsCitations \
             (materialsCitationId, treatmentId, typeStatus, country, collectionCode, \
              latitude, longitude, specimenCount, specimenCountMale, specimenCountFemale) \
             VALUES (?1, ?2, ?3, ?4, ?5, 47.5, 13.25, ?6, ?7, ?8)",
        )
        .bind(id)
        .bind(treatment)
        .bind(type_status)
        .bind(country)
        .bind(code)
        .bind(specimens)
        .bind(male)
        .bind(female)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        "INSERT INTO figureCitations (figureCitationId, treatmentId, captionText, httpUri, thumbUri) \
         VALUES ('FC1', 'T001', 'Habitus, dorsal view', 'https://example.org/fc1.png', \
                 'https://example.org/fc1-thumb.png')",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO bibRefCitations (bibRefCitationId, treatmentId, refString, type, year) \
         VALUES ('BR1', 'T001', 'Smith 1990. Beetles of the Alps.', 'book', 1990)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO vbibrefcitations (bibRefCitationId, refString) \
         VALUES ('BR1', 'Smith 1990. Beetles of the Alps.')",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO treatmentCitations (treatmentCitationId, treatmentId, treatmentCitation, refString) \
         VALUES ('TC1', 'T001', 'Carabus alpha Smith, 1990', 'Smith 1990')",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Working facet and related queries next to ones over missing tables, and a
/// resource whose data statement cannot run.
pub const FAULTY_DESCRIPTORS: &str = r#"[
  {
    "name": "treatments",
    "primaryKey": "treatmentId",
    "columns": [
      { "name": "treatmentId", "expr": "treatments.treatmentId", "queryMode": "equal" },
      {
        "name": "journalYear",
        "expr": "treatments.journalYear",
        "queryMode": "equal",
        "rule": { "type": "range", "min": 1700, "max": 2100 }
      }
    ],
    "queries": {
      "count": {
        "select": ["Count(*) AS numOfRecords"],
        "from": ["treatments"],
        "constraints": ["treatments.deleted = 0"]
      },
      "data": {
        "select": ["treatments.treatmentId AS treatmentId"],
        "from": ["treatments"],
        "constraints": ["treatments.deleted = 0"],
        "orderBy": "treatments.treatmentId",
        "paginated": true
      },
      "facets": [
        {
          "name": "kingdom",
          "select": ["treatments.kingdom AS kingdom", "Count(*) AS c"],
          "from": ["treatments"],
          "constraints": ["treatments.deleted = 0"],
          "groupBy": "treatments.kingdom",
          "orderBy": "c DESC"
        },
        {
          "name": "missing",
          "select": ["nowhere.label AS label", "Count(*) AS c"],
          "from": ["treatments", "JOIN nowhere ON nowhere.treatmentId = treatments.treatmentId"],
          "groupBy": "nowhere.label"
        }
      ],
      "related": [
        {
          "name": "treatmentAuthors",
          "resource": "treatmentAuthors",
          "idColumn": "treatmentAuthorId",
          "select": ["treatmentAuthorId", "treatmentAuthor"],
          "from": ["treatmentAuthors"],
          "constraints": ["treatmentAuthors.treatmentId = @treatmentId"]
        },
        {
          "name": "specimens",
          "resource": "specimens",
          "idColumn": "specimenId",
          "select": ["specimenId"],
          "from": ["specimens"],
          "constraints": ["specimens.treatmentId = @treatmentId"]
        }
      ]
    }
  },
  {
    "name": "ghosts",
    "primaryKey": "treatmentId",
    "columns": [
      { "name": "treatmentId", "expr": "treatments.treatmentId", "queryMode": "equal" },
      {
        "name": "journalYear",
        "expr": "treatments.journalYear",
        "queryMode": "equal",
        "rule": { "type": "range", "min": 1700, "max": 2100 }
      }
    ],
    "queries": {
      "count": {
        "select": ["Count(*) AS numOfRecords"],
        "from": ["treatments"],
        "constraints": ["treatments.deleted = 0"]
      },
      "data": {
        "select": ["treatments.ectoplasm AS ectoplasm"],
        "from": ["treatments"],
        "constraints": ["treatments.deleted = 0"],
        "paginated": true
      }
    }
  }
]"#;
