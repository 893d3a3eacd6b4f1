//! Curated clinical lexicons.
//!
//! Korean tables are matched exactly. Latin tables are sorted lowercase for
//! binary search and additionally accept OCR-damaged spellings through an
//! edit-distance lookup.

/// Latin drug names. Sorted, lowercase.
pub const MEDICATION_LATIN: &[&str] = &[
    "albuterol", "allopurinol", "amlodipine", "amoxicillin", "aspirin",
    "atenolol", "atorvastatin", "azithromycin", "bisoprolol", "budesonide",
    "candesartan", "carbamazepine", "carvedilol", "cefixime", "ciprofloxacin",
    "citalopram", "clarithromycin", "clopidogrel", "codeine", "colchicine",
    "diclofenac", "digoxin", "donepezil", "duloxetine", "enalapril",
    "escitalopram", "esomeprazole", "famotidine", "fluconazole", "fluoxetine",
    "fluticasone", "furosemide", "gabapentin", "glimepiride", "hydrochlorothiazide",
    "ibuprofen", "insulin", "lansoprazole", "levetiracetam", "levofloxacin",
    "levothyroxine", "lisinopril", "losartan", "metformin", "methotrexate",
    "metoprolol", "montelukast", "morphine", "naproxen", "nitroglycerin",
    "olmesartan", "omeprazole", "ondansetron", "pantoprazole", "paracetamol",
    "perindopril", "phenytoin", "pravastatin", "prednisolone", "prednisone",
    "pregabalin", "propranolol", "quetiapine", "rabeprazole", "ramipril",
    "ranitidine", "rebamipide", "risperidone", "rivaroxaban", "rosuvastatin",
    "sertraline", "simvastatin", "sitagliptin", "spironolactone", "sucralfate",
    "tamsulosin", "telmisartan", "tramadol", "valproate", "valsartan",
    "venlafaxine", "warfarin",
];

pub const MEDICATION_KO: &[&str] = &[
    "오메프라졸", "란소프라졸", "에소메프라졸", "판토프라졸", "라베프라졸",
    "레바미피드", "파모티딘", "라니티딘", "수크랄페이트", "아스피린",
    "타이레놀", "아세트아미노펜", "이부프로펜", "나프록센", "트라마돌",
    "메트포르민", "글리메피리드", "시타글립틴", "인슐린", "아토르바스타틴",
    "로수바스타틴", "심바스타틴", "암로디핀", "로사르탄", "발사르탄",
    "텔미사르탄", "클로피도그렐", "와파린", "아목시실린", "세픽심",
    "레보플록사신", "클래리스로마이신", "프레드니솔론", "가바펜틴", "프레가발린",
    "레보티록신", "몬테루카스트",
];

/// Latin diagnosis terms. Sorted, lowercase.
pub const DIAGNOSIS_LATIN: &[&str] = &[
    "anemia", "appendicitis", "arrhythmia", "arthritis", "asthma",
    "atherosclerosis", "bronchitis", "cholecystitis", "cholelithiasis", "cirrhosis",
    "colitis", "dementia", "dermatitis", "diabetes", "duodenitis",
    "esophagitis", "gastritis", "gastroenteritis", "hepatitis", "hyperlipidemia",
    "hypertension", "hyperthyroidism", "hypotension", "hypothyroidism", "osteoarthritis",
    "osteoporosis", "pancreatitis", "pneumonia", "sinusitis", "tachycardia",
    "thrombosis", "tuberculosis",
];

pub const DIAGNOSIS_KO: &[&str] = &[
    "위궤양", "십이지장궤양", "위염", "만성위염", "위축성위염", "역류성식도염",
    "위식도역류질환", "과민성대장증후군", "장염", "충수염", "담석증", "담낭염",
    "췌장염", "간염", "지방간", "간경화", "고혈압", "저혈압", "당뇨병",
    "고지혈증", "이상지질혈증", "협심증", "심근경색", "부정맥", "심부전",
    "뇌경색", "뇌출혈", "뇌졸중", "치매", "파킨슨병", "폐렴", "천식", "기관지염",
    "결핵", "위암", "대장암", "간암", "폐암", "유방암", "갑상선암", "갑상선기능저하증",
    "갑상선기능항진증", "빈혈", "골다공증", "관절염", "퇴행성관절염", "추간판탈출증",
    "척추관협착증", "요추염좌", "골절", "백내장", "녹내장", "우울증", "신부전",
];

pub const PROCEDURE_KO: &[&str] = &[
    "위내시경", "대장내시경", "상부위장관내시경", "복부초음파", "심장초음파",
    "혈액검사", "소변검사", "조직검사", "심전도", "흉부촬영", "관상동맥조영술",
    "충수절제술", "담낭절제술", "위절제술", "인공관절치환술", "척추유합술",
    "내시경점막하박리술", "용종절제술", "스텐트삽입술", "봉합술",
];

pub const PROCEDURE_LATIN: &[&str] = &[
    "angiography", "appendectomy", "arthroplasty", "arthroscopy", "biopsy",
    "bronchoscopy", "cholecystectomy", "colonoscopy", "endoscopy", "gastrectomy",
    "gastroscopy", "laparoscopy", "mammography", "polypectomy", "tomography",
];

/// Longest first so alternation prefers the longer organ name.
pub const ANATOMY_KO: &[&str] = &[
    "십이지장", "갑상선", "전립선", "고관절", "팔꿈치", "대퇴골", "위장", "대장",
    "소장", "식도", "췌장", "담낭", "신장", "방광", "자궁", "난소", "유방", "심장",
    "척추", "요추", "경추", "흉추", "무릎", "어깨", "발목", "손목", "경골", "폐",
    "간", "뇌", "위",
];

pub const ANATOMY_LATIN: &[&str] = &[
    "colon", "duodenum", "esophagus", "heart", "kidney", "knee", "liver", "lung",
    "pancreas", "shoulder", "spine", "stomach",
];

/// KCD disease-code index entry. Retired codes carry their replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KcdEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub replaced_by: Option<&'static str>,
}

const fn kcd(code: &'static str, name: &'static str) -> KcdEntry {
    KcdEntry { code, name, replaced_by: None }
}

const fn retired(code: &'static str, name: &'static str, replaced_by: &'static str) -> KcdEntry {
    KcdEntry { code, name, replaced_by: Some(replaced_by) }
}

/// Sorted by code.
pub const KCD_CODES: &[KcdEntry] = &[
    kcd("C16", "위의 악성 신생물"), kcd("C18", "결장의 악성 신생물"), kcd("C34", "기관지 및 폐의 악성 신생물"),
    kcd("C50", "유방의 악성 신생물"), kcd("E11", "2형 당뇨병"), kcd("E78", "지질단백질대사장애 및 기타 지질증"),
    kcd("I10", "본태성(원발성) 고혈압"), kcd("I20", "협심증"), kcd("I21", "급성 심근경색증"), kcd("I63", "뇌경색증"),
    retired("I84", "치핵", "K64"), retired("I84.9", "상세불명의 치핵", "K64.9"),
    kcd("J18", "상세불명 병원체의 폐렴"), kcd("J45", "천식"), kcd("K21", "위-식도역류병"),
    kcd("K21.9", "식도염이 없는 위-식도역류병"), kcd("K25", "위궤양"),
    kcd("K25.9", "출혈 또는 천공이 없는 급성인지 만성인지 상세불명인 위궤양"),
    kcd("K26", "십이지장궤양"), kcd("K29", "위염 및 십이지장염"), kcd("K29.7", "상세불명의 위염"),
    kcd("K35", "급성 충수염"), kcd("K64", "치핵 및 항문주위정맥혈전증"), kcd("K64.9", "상세불명의 치핵"),
    kcd("K80", "담석증"), kcd("M17", "무릎관절증"), kcd("M51", "기타 추간판장애"), kcd("M81", "골다공증"),
    kcd("S72", "대퇴골의 골절"),
];

pub fn kcd_lookup(code: &str) -> Option<&'static KcdEntry> {
    let code = code.to_ascii_uppercase();
    // K25.9 not indexed: fall back to the category code.
    let category = code.split('.').next().unwrap_or_default();
    let found = [code.as_str(), category]
        .into_iter()
        .find_map(|c| KCD_CODES.binary_search_by(|e| e.code.cmp(c)).ok())
        .map(|i| &KCD_CODES[i]);
    found
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexiconMatch {
    Exact,
    /// OCR-tolerant hit on a Latin term.
    Fuzzy { term: &'static str, distance: u32 },
    None,
}

impl LexiconMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy { .. } => "fuzzy",
            Self::None => "none",
        }
    }
}

/// Exact lookup in a Korean table.
pub fn lookup_ko(table: &[&str], word: &str) -> LexiconMatch {
    if table.contains(&word) {
        LexiconMatch::Exact
    } else {
        LexiconMatch::None
    }
}

/// Lookup in a sorted lowercase Latin table. Words of at least 5 characters
/// also match an unambiguous entry within edit distance 2.
pub fn lookup_latin(table: &'static [&'static str], word: &str) -> LexiconMatch {
    let lower = word.to_lowercase();
    if table.binary_search(&lower.as_str()).is_ok() {
        return LexiconMatch::Exact;
    }
    if lower.chars().count() < 5 {
        return LexiconMatch::None;
    }

    let mut best_term: Option<&'static str> = None;
    let mut best_distance = 3u32;
    let mut ambiguous = false;

    for &term in table {
        let len_diff = (lower.len() as i64 - term.len() as i64).unsigned_abs();
        if len_diff > 2 {
            continue;
        }
        let dist = edit_distance(&lower, term);
        if dist < best_distance {
            best_distance = dist;
            best_term = Some(term);
            ambiguous = false;
        } else if dist == best_distance && best_term.is_some() {
            ambiguous = true;
        }
    }

    match best_term {
        Some(term) if !ambiguous => LexiconMatch::Fuzzy { term, distance: best_distance },
        _ => LexiconMatch::None,
    }
}

/// Levenshtein distance over characters.
pub fn edit_distance(a: &str, b: &str) -> u32 {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<u32> = (0..=b_chars.len() as u32).collect();
    for (i, a_ch) in a.chars().enumerate() {
        let mut curr = vec![i as u32 + 1; b_chars.len() + 1];
        for (j, &b_ch) in b_chars.iter().enumerate() {
            let cost = u32::from(a_ch != b_ch);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        prev = curr;
    }
    prev[b_chars.len()]
}
