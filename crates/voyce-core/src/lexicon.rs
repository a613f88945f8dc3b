//! Offline lexicon: phrase translations, cultural notes, pronunciation
//! guides, city culture data, and jurisdiction emergency numbers.
//!
//! This is the local data provider the resolver and response generator fall
//! back to when the remote backend is unreachable. Every lookup is
//! infallible: unknown cities fall back to the default city and unknown
//! countries to the universal emergency entry, so callers behave identically
//! whether the data came from a real service or these tables.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// Phrase category. Categories are scanned in their declared order
/// (greetings, courtesy, questions, emergency); the first matching phrase
/// wins, with no relevance ranking.
#[derive(Debug, Clone)]
pub struct PhraseCategory {
    pub name: String,
    pub phrases: Vec<PhraseEntry>,
}

#[derive(Debug, Clone)]
pub struct PhraseEntry {
    /// Normalized (lower-case) source phrase in English.
    pub phrase: String,
    /// Target language code -> translation (with transliteration).
    pub translations: HashMap<String, String>,
}

/// Local travel knowledge for one city.
#[derive(Debug, Clone)]
pub struct CityCulture {
    pub greetings: Vec<String>,
    pub customs: Vec<String>,
    pub emergencies: Vec<String>,
    pub dining: Vec<String>,
    pub transportation: Vec<String>,
}

/// A hit in the offline phrase tables.
#[derive(Debug, Clone)]
pub struct LocalMatch {
    pub category: String,
    pub phrase: String,
    pub translation: String,
}

const DEFAULT_CITY: &str = "chennai";
pub const UNIVERSAL_EMERGENCY_NUMBER: &str = "112 - Universal Emergency Number";

static BUILTIN: Lazy<Arc<LexiconStore>> = Lazy::new(|| Arc::new(LexiconStore::builtin()));

pub struct LexiconStore {
    categories: Vec<PhraseCategory>,
    /// phrase -> (language -> note)
    cultural_notes: Vec<(String, HashMap<String, String>)>,
    /// language -> [(translated fragment, pronunciation guide)]
    pronunciation: HashMap<String, Vec<(String, String)>>,
    /// lower-case city name -> culture data
    cities: HashMap<String, CityCulture>,
    /// lower-case country name -> emergency numbers
    emergency_numbers: HashMap<String, Vec<String>>,
}

impl LexiconStore {
    /// Process-wide shared instance of the built-in tables.
    pub fn shared() -> Arc<LexiconStore> {
        Arc::clone(&BUILTIN)
    }

    /// Scans the categorized phrase tables for a substring match (the input
    /// contains the stored phrase, or the stored phrase contains the input)
    /// with a translation in the target language. Fixed iteration order;
    /// first hit wins.
    pub fn lookup_phrase(&self, text: &str, to_lang: &str) -> Option<LocalMatch> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        for category in &self.categories {
            for entry in &category.phrases {
                if needle.contains(&entry.phrase) || entry.phrase.contains(&needle) {
                    if let Some(translation) = entry.translations.get(to_lang) {
                        return Some(LocalMatch {
                            category: category.name.clone(),
                            phrase: entry.phrase.clone(),
                            translation: translation.clone(),
                        });
                    }
                }
            }
        }
        None
    }

    /// Cultural note for a phrase/language pair. Falls back to a generic
    /// respect reminder when the phrase is known but the language is not,
    /// and to a context reminder when the phrase is unknown.
    pub fn cultural_note(&self, text: &str, to_lang: &str) -> String {
        let lower = text.to_lowercase();
        for (phrase, notes) in &self.cultural_notes {
            if lower.contains(phrase.as_str()) {
                return notes
                    .get(to_lang)
                    .cloned()
                    .unwrap_or_else(|| {
                        "Remember to be respectful of local customs when using this phrase."
                            .to_string()
                    });
            }
        }
        "Consider the cultural context when using this translation.".to_string()
    }

    /// Pronunciation guide for a translated text in the given language, if
    /// one of the known fragments appears in it.
    pub fn pronunciation(&self, translated: &str, lang: &str) -> Option<String> {
        let guides = self.pronunciation.get(lang)?;
        guides
            .iter()
            .find(|(fragment, _)| translated.contains(fragment.as_str()))
            .map(|(_, guide)| guide.clone())
    }

    /// Culture data for a city (case-insensitive), falling back to the
    /// default city when unknown or absent.
    pub fn city_culture(&self, city: Option<&str>) -> &CityCulture {
        let key = city.map(|c| c.to_lowercase());
        key.as_deref()
            .and_then(|k| self.cities.get(k))
            .unwrap_or_else(|| {
                self.cities
                    .get(DEFAULT_CITY)
                    .expect("default city present in builtin tables")
            })
    }

    /// Jurisdiction emergency numbers by country (case-insensitive), with
    /// the universal fallback entry for unmatched or missing countries.
    pub fn emergency_numbers(&self, country: Option<&str>) -> Vec<String> {
        country
            .map(|c| c.to_lowercase())
            .and_then(|k| self.emergency_numbers.get(&k).cloned())
            .unwrap_or_else(|| vec![UNIVERSAL_EMERGENCY_NUMBER.to_string()])
    }

    fn builtin() -> Self {
        Self {
            categories: builtin_phrases(),
            cultural_notes: builtin_cultural_notes(),
            pronunciation: builtin_pronunciation(),
            cities: builtin_cities(),
            emergency_numbers: builtin_emergency_numbers(),
        }
    }
}

fn translations(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(lang, text)| (lang.to_string(), text.to_string()))
        .collect()
}

fn entry(phrase: &str, pairs: &[(&str, &str)]) -> PhraseEntry {
    PhraseEntry {
        phrase: phrase.to_string(),
        translations: translations(pairs),
    }
}

fn category(name: &str, phrases: Vec<PhraseEntry>) -> PhraseCategory {
    PhraseCategory {
        name: name.to_string(),
        phrases,
    }
}

fn builtin_phrases() -> Vec<PhraseCategory> {
    vec![
        category(
            "greetings",
            vec![
                entry(
                    "hello",
                    &[
                        ("ta", "வணக்கம் (Vanakkam)"),
                        ("hi", "नमस्ते (Namaste)"),
                        ("es", "Hola"),
                        ("fr", "Bonjour"),
                        ("de", "Hallo"),
                        ("it", "Ciao"),
                        ("pt", "Olá"),
                        ("ja", "こんにちは (Konnichiwa)"),
                        ("ko", "안녕하세요 (Annyeonghaseyo)"),
                        ("zh", "你好 (Nǐ hǎo)"),
                        ("ar", "مرحبا (Marhaba)"),
                    ],
                ),
                entry(
                    "goodbye",
                    &[
                        ("ta", "பிரியாவிடை (Piriyaavidai)"),
                        ("hi", "अलविदा (Alvida)"),
                        ("es", "Adiós"),
                        ("fr", "Au revoir"),
                        ("de", "Auf Wiedersehen"),
                        ("it", "Arrivederci"),
                        ("pt", "Tchau"),
                        ("ja", "さようなら (Sayounara)"),
                        ("ko", "안녕히 가세요 (Annyeonghi gaseyo)"),
                        ("zh", "再见 (Zàijiàn)"),
                        ("ar", "وداعا (Wadaan)"),
                    ],
                ),
            ],
        ),
        category(
            "courtesy",
            vec![
                entry(
                    "thank you",
                    &[
                        ("ta", "நன்றி (Nandri)"),
                        ("hi", "धन्यवाद (Dhanyawad)"),
                        ("es", "Gracias"),
                        ("fr", "Merci"),
                        ("de", "Danke"),
                        ("it", "Grazie"),
                        ("pt", "Obrigado"),
                        ("ja", "ありがとう (Arigatou)"),
                        ("ko", "감사합니다 (Gamsahamnida)"),
                        ("zh", "谢谢 (Xièxiè)"),
                        ("ar", "شكرا (Shukran)"),
                    ],
                ),
                entry(
                    "please",
                    &[
                        ("ta", "தயவுசெய்து (Thayavuseithu)"),
                        ("hi", "कृपया (Kripaya)"),
                        ("es", "Por favor"),
                        ("fr", "S'il vous plaît"),
                        ("de", "Bitte"),
                        ("it", "Per favore"),
                        ("pt", "Por favor"),
                        ("ja", "お願いします (Onegaishimasu)"),
                        ("ko", "부탁합니다 (Butakhamnida)"),
                        ("zh", "请 (Qǐng)"),
                        ("ar", "من فضلك (Min fadlik)"),
                    ],
                ),
                entry(
                    "excuse me",
                    &[
                        ("ta", "மன்னிக்கவும் (Mannikkavum)"),
                        ("hi", "माफ़ करें (Maaf karen)"),
                        ("es", "Disculpe"),
                        ("fr", "Excusez-moi"),
                        ("de", "Entschuldigung"),
                        ("it", "Mi scusi"),
                        ("pt", "Com licença"),
                        ("ja", "すみません (Sumimasen)"),
                        ("ko", "실례합니다 (Sillyehamnida)"),
                        ("zh", "不好意思 (Bù hǎoyìsi)"),
                        ("ar", "عذرا (Uzran)"),
                    ],
                ),
            ],
        ),
        category(
            "questions",
            vec![
                entry(
                    "where is",
                    &[
                        ("ta", "எங்கே இருக்கிறது (Enge irukkiradhu)"),
                        ("hi", "कहाँ है (Kahan hai)"),
                        ("es", "Dónde está"),
                        ("fr", "Où est"),
                        ("de", "Wo ist"),
                        ("it", "Dove è"),
                        ("pt", "Onde está"),
                        ("ja", "どこですか (Doko desu ka)"),
                        ("ko", "어디에 있나요 (Eodie innayo)"),
                        ("zh", "在哪里 (Zài nǎlǐ)"),
                        ("ar", "أين (Ayna)"),
                    ],
                ),
                entry(
                    "how much",
                    &[
                        ("ta", "எவ்வளவு (Evvalaavu)"),
                        ("hi", "कितना (Kitna)"),
                        ("es", "Cuánto cuesta"),
                        ("fr", "Combien"),
                        ("de", "Wie viel"),
                        ("it", "Quanto costa"),
                        ("pt", "Quanto custa"),
                        ("ja", "いくらですか (Ikura desu ka)"),
                        ("ko", "얼마예요 (Eolmayeyo)"),
                        ("zh", "多少钱 (Duōshǎo qián)"),
                        ("ar", "كم (Kam)"),
                    ],
                ),
                entry(
                    "do you speak english",
                    &[
                        ("ta", "உங்களுக்கு ஆங்கிலம் தெரியுமா (Ungalukku aangilam theriyuma)"),
                        ("hi", "क्या आप अंग्रेजी बोलते हैं (Kya aap angrezi bolte hain)"),
                        ("es", "¿Habla inglés?"),
                        ("fr", "Parlez-vous anglais?"),
                        ("de", "Sprechen Sie Englisch?"),
                        ("it", "Parla inglese?"),
                        ("pt", "Você fala inglês?"),
                        ("ja", "英語を話しますか (Eigo wo hanashimasu ka)"),
                        ("ko", "영어 하세요 (Yeongeo haseyo)"),
                        ("zh", "你会说英语吗 (Nǐ huì shuō yīngyǔ ma)"),
                        ("ar", "هل تتكلم الإنجليزية (Hal tatakallam al-injliiziyya)"),
                    ],
                ),
            ],
        ),
        category(
            "emergency",
            vec![
                entry(
                    "help",
                    &[
                        ("ta", "உதவி (Udhavi)"),
                        ("hi", "मदद (Madad)"),
                        ("es", "Ayuda"),
                        ("fr", "Aide"),
                        ("de", "Hilfe"),
                        ("it", "Aiuto"),
                        ("pt", "Ajuda"),
                        ("ja", "助けて (Tasukete)"),
                        ("ko", "도움 (Doum)"),
                        ("zh", "帮助 (Bāngzhù)"),
                        ("ar", "مساعدة (Musaada)"),
                    ],
                ),
                entry(
                    "call police",
                    &[
                        ("ta", "காவல்துறையை அழைக்கவும் (Kaavalthuraiyai azhaikavum)"),
                        ("hi", "पुलिस को बुलाएं (Police ko bulayen)"),
                        ("es", "Llame a la policía"),
                        ("fr", "Appelez la police"),
                        ("de", "Rufen Sie die Polizei"),
                        ("it", "Chiama la polizia"),
                        ("pt", "Chame a polícia"),
                        ("ja", "警察を呼んで (Keisatsu wo yonde)"),
                        ("ko", "경찰을 불러주세요 (Gyeongchareul bulleojuseyo)"),
                        ("zh", "叫警察 (Jiào jǐngchá)"),
                        ("ar", "اتصل بالشرطة (Ittasil bil-shurta)"),
                    ],
                ),
                entry(
                    "i need a doctor",
                    &[
                        ("ta", "எனக்கு மருத்துவர் வேண்டும் (Enakku maruthuvar vendum)"),
                        ("hi", "मुझे डॉक्टर चाहिए (Mujhe doctor chahiye)"),
                        ("es", "Necesito un médico"),
                        ("fr", "J'ai besoin d'un médecin"),
                        ("de", "Ich brauche einen Arzt"),
                        ("it", "Ho bisogno di un medico"),
                        ("pt", "Preciso de um médico"),
                        ("ja", "医者が必要です (Isha ga hitsuyou desu)"),
                        ("ko", "의사가 필요해요 (Uisaga piryohaeyo)"),
                        ("zh", "我需要医生 (Wǒ xūyào yīshēng)"),
                        ("ar", "أحتاج طبيب (Ahtaj tabiib)"),
                    ],
                ),
            ],
        ),
    ]
}

fn builtin_cultural_notes() -> Vec<(String, HashMap<String, String>)> {
    vec![
        (
            "hello".to_string(),
            translations(&[
                ("ta", "In Tamil culture, \"Vanakkam\" is said with palms pressed together. It shows respect."),
                ("hi", "Namaste is accompanied by a slight bow with palms together. Very respectful greeting."),
                ("ja", "Bow slightly when saying Konnichiwa. The depth of bow shows respect level."),
                ("ar", "Marhaba is casual. For formal situations, use \"Ahlan wa sahlan\"."),
            ]),
        ),
        (
            "thank you".to_string(),
            translations(&[
                ("ta", "Nandri is formal. For casual thanks, you can say \"Thanks\" in English."),
                ("hi", "Dhanyawad is very formal. \"Shukriya\" is more casual."),
                ("ja", "Arigatou is casual. \"Arigatou gozaimasu\" is more polite."),
                ("de", "Danke is casual. \"Vielen Dank\" is more formal."),
            ]),
        ),
    ]
}

fn builtin_pronunciation() -> HashMap<String, Vec<(String, String)>> {
    let guides = |pairs: &[(&str, &str)]| {
        pairs
            .iter()
            .map(|(orig, guide)| (orig.to_string(), guide.to_string()))
            .collect::<Vec<_>>()
    };
    let mut map = HashMap::new();
    map.insert(
        "ta".to_string(),
        guides(&[
            ("வணக்கம்", "VA-nak-kam"),
            ("நன்றி", "NAN-dri"),
            ("எங்கே", "EN-gay"),
        ]),
    );
    map.insert(
        "hi".to_string(),
        guides(&[
            ("नमस्ते", "na-mas-TAY"),
            ("धन्यवाद", "dhan-ya-VAAD"),
            ("कहाँ", "ka-HAAN"),
        ]),
    );
    map.insert(
        "ja".to_string(),
        guides(&[
            ("こんにちは", "kon-ni-chi-WA"),
            ("ありがとう", "a-ri-ga-TOU"),
            ("どこ", "DO-ko"),
        ]),
    );
    map
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn builtin_cities() -> HashMap<String, CityCulture> {
    let mut map = HashMap::new();
    map.insert(
        "chennai".to_string(),
        CityCulture {
            greetings: strings(&[
                "Vanakkam with palms pressed together",
                "Respectful nod for elders",
            ]),
            customs: strings(&[
                "Remove shoes before entering homes",
                "Use right hand for giving/receiving",
            ]),
            emergencies: strings(&[
                "108 - Medical",
                "100 - Police",
                "101 - Fire",
                "1363 - Tourist Helpline",
            ]),
            dining: strings(&[
                "Eat with right hand",
                "Finish everything on your plate",
                "Wash hands before and after meals",
            ]),
            transportation: strings(&[
                "Auto-rickshaws negotiate fare",
                "Metro is efficient",
                "Uber/Ola available",
            ]),
        },
    );
    map.insert(
        "mumbai".to_string(),
        CityCulture {
            greetings: strings(&["Namaste with folded hands", "Casual wave for peers"]),
            customs: strings(&[
                "Respect local train etiquette",
                "Dress modestly in religious places",
            ]),
            emergencies: strings(&[
                "108 - Medical",
                "100 - Police",
                "101 - Fire",
                "1916 - Tourist Helpline",
            ]),
            dining: strings(&[
                "Street food is safe from busy stalls",
                "Tipping 10% is standard",
            ]),
            transportation: strings(&[
                "Local trains are lifeline",
                "Taxis use meters",
                "Traffic is heavy",
            ]),
        },
    );
    map
}

fn builtin_emergency_numbers() -> HashMap<String, Vec<String>> {
    let mut map = HashMap::new();
    map.insert(
        "india".to_string(),
        strings(&[
            "108 - Medical Emergency",
            "100 - Police",
            "101 - Fire",
            "112 - Universal Emergency",
        ]),
    );
    map.insert(
        "united states".to_string(),
        strings(&["911 - Emergency Services"]),
    );
    map.insert(
        "united kingdom".to_string(),
        strings(&["999 - Emergency Services", "112 - European Emergency"]),
    );
    map.insert(
        "germany".to_string(),
        strings(&["112 - Emergency Services", "110 - Police"]),
    );
    map.insert(
        "france".to_string(),
        strings(&[
            "112 - Emergency Services",
            "15 - Medical",
            "17 - Police",
            "18 - Fire",
        ]),
    );
    map.insert("spain".to_string(), strings(&["112 - Emergency Services"]));
    map.insert("italy".to_string(), strings(&["112 - Emergency Services"]));
    map.insert(
        "japan".to_string(),
        strings(&["119 - Fire/Medical", "110 - Police"]),
    );
    map.insert(
        "china".to_string(),
        strings(&["120 - Medical", "110 - Police", "119 - Fire"]),
    );
    map
}
