//! HELP topic table

/// Usage text per command, one entry per line of output
pub const HELP_TOPICS: &[(&str, &str)] = &[
    ("AUTO", "AUTO [start[,increment]]\nNUMBERS NEW LINES AUTOMATICALLY (DEFAULT 10,10).\nENTER A BLANK LINE TO STOP."),
    ("CLS", "CLS\nCLEARS THE SCREEN."),
    ("DATA", "DATA value[,value...]\nLISTS VALUES FOR READ. STRINGS MAY BE QUOTED."),
    ("DIM", "DIM name(size[,size...])[,...]\nDECLARES ARRAYS. EACH AXIS HOLDS INDICES 0 TO size."),
    ("END", "END\nSTOPS THE PROGRAM."),
    ("FILES", "FILES\nLISTS SAVED PROGRAMS."),
    ("FOR", "FOR var = start TO end [STEP step]\nREPEATS THE LINES UP TO THE MATCHING NEXT."),
    ("GOSUB", "GOSUB line\nCALLS THE SUBROUTINE AT line. RETURN COMES BACK."),
    ("GOTO", "GOTO line\nCONTINUES EXECUTION AT line."),
    ("HELP", "HELP [command]\nSHOWS HELP FOR A COMMAND, OR LISTS ALL TOPICS."),
    ("IF", "IF condition THEN line|statement\nIF condition GOTO line\nRUNS THE BRANCH WHEN condition IS NOT ZERO."),
    ("INPUT", "INPUT [\"prompt\";] var\nWAITS FOR A VALUE FROM THE KEYBOARD."),
    ("KILL", "KILL \"name\"\nDELETES A SAVED PROGRAM."),
    ("LET", "[LET] var = expression\nASSIGNS A VALUE. THE WORD LET IS OPTIONAL."),
    ("LIST", "LIST [from][-[to]]\nSHOWS PROGRAM LINES IN ORDER."),
    ("LOAD", "LOAD \"name\"\nREPLACES THE CURRENT PROGRAM WITH A SAVED ONE."),
    ("NEW", "NEW\nERASES THE PROGRAM AND ALL VARIABLES."),
    ("NEXT", "NEXT [var[,var...]]\nENDS A FOR LOOP."),
    ("ON", "ON expression GOTO|GOSUB line[,line...]\nJUMPS TO THE LINE SELECTED BY expression."),
    ("POKE", "POKE address, value\nSTORES A BYTE IN MEMORY (ADDRESS 0-65535)."),
    ("PRINT", "PRINT item[;|,item...]\n? IS SHORT FOR PRINT. ; JOINS ITEMS, , MOVES TO THE NEXT ZONE."),
    ("READ", "READ var[,var...]\nTAKES THE NEXT VALUES FROM DATA."),
    ("REM", "REM text\nA COMMENT. THE REST OF THE LINE IS IGNORED."),
    ("RESTORE", "RESTORE\nMAKES READ START AGAIN FROM THE FIRST DATA VALUE."),
    ("RETURN", "RETURN\nRETURNS FROM A GOSUB."),
    ("RUN", "RUN [line]\nRUNS THE PROGRAM FROM THE START OR FROM line."),
    ("SAVE", "SAVE \"name\"\nSAVES THE CURRENT PROGRAM."),
];

/// Look up the usage text for a command
pub fn lookup(topic: &str) -> Option<&'static str> {
    let topic = topic.trim().to_ascii_uppercase();
    HELP_TOPICS
        .iter()
        .find(|(name, _)| *name == topic)
        .map(|(_, text)| *text)
}

/// All topic names, sorted
pub fn topic_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = HELP_TOPICS.iter().map(|(name, _)| *name).collect();
    names.sort_unstable();
    names
}
